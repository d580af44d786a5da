//! Render each uploaded PDF to one JPEG per page in the same bucket.

use aws_lambda_events::event::s3::S3Event;

use crate::{
    config::Config, naming, pages, prelude::*, response::HandlerResponse, storage::Storage,
};

/// Handle one S3 event, rendering every uploaded PDF it names.
///
/// Records are processed strictly in order, and the first failure abandons the
/// rest of the batch so the whole event gets retried.
#[instrument(level = "debug", skip_all, fields(records = event.records.len()))]
pub async fn handle(
    event: S3Event,
    storage: &dyn Storage,
    config: &Config,
) -> Result<HandlerResponse> {
    // When lots of PDFs get uploaded in a short window, S3 batches them
    // together into a single event.
    let record_count = event.records.len();
    for record in event.records {
        let raw_key = record
            .s3
            .object
            .key
            .context("event record has no object key")?;
        let key = naming::decode_object_key(&raw_key)?;
        let job_id = naming::job_id_from_key(&key);
        rasterize_document(&key, &job_id, storage, config).await?;
    }
    Ok(HandlerResponse::ok(format!(
        "{record_count} job(s) ran successfully!"
    )))
}

/// Render one document and upload its pages.
#[instrument(level = "debug", skip_all, fields(key = %key, job_id = %job_id))]
async fn rasterize_document(
    key: &str,
    job_id: &str,
    storage: &dyn Storage,
    config: &Config,
) -> Result<()> {
    // Temporarily download the file.
    let pdf_path = naming::scratch_pdf_path(&config.scratch_dir, job_id);
    storage.download_to(&config.bucket, key, &pdf_path).await?;

    // Convert the PDF to images using Poppler.
    let pages = pages::rasterize_pdf(
        &pdf_path,
        &config.scratch_dir,
        job_id,
        config.poppler_path.as_deref(),
    )
    .await?;

    // Save each page as a JPEG image in the bucket.
    for page in &pages {
        let output_key = naming::page_image_key(job_id, page.number);
        storage
            .upload_file(&config.bucket, &output_key, &page.path)
            .await?;
        info!(key = %output_key, bucket = %config.bucket, "Uploaded page image");
    }

    // Clean up the scratch files.
    tokio::fs::remove_file(&pdf_path)
        .await
        .with_context(|| format!("failed to remove {:?}", pdf_path.display()))?;
    for page in &pages {
        tokio::fs::remove_file(&page.path)
            .await
            .with_context(|| format!("failed to remove {:?}", page.path.display()))?;
    }

    info!(
        job_id = %job_id,
        page_count = pages.len(),
        bucket = %config.bucket,
        "Processed PDF"
    );
    Ok(())
}
