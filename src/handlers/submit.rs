//! Submit each uploaded PDF to Textract and publish its page listing.

use aws_lambda_events::event::s3::S3Event;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{
    config::Config,
    naming, pages,
    prelude::*,
    response::HandlerResponse,
    storage::Storage,
    textract::{Submission, TextDetection},
};

/// Every page of one document, as base64 data URLs in page order, so
/// consumers can fetch them all in a single read.
#[derive(Debug, Serialize)]
pub struct PageListing {
    pub base64_urls: Vec<String>,
}

impl PageListing {
    /// Serialize with four-space indentation and sorted keys.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .context("failed to serialize page listing")?;
        Ok(buf)
    }
}

/// Handle one S3 event, starting a Textract job for every uploaded PDF.
///
/// A document Textract turns down is counted and reported in the response
/// body. Anything else going wrong abandons the rest of the batch so the
/// whole event gets retried.
#[instrument(level = "debug", skip_all, fields(records = event.records.len()))]
pub async fn handle(
    event: S3Event,
    storage: &dyn Storage,
    detector: &dyn TextDetection,
    config: &Config,
) -> Result<HandlerResponse> {
    // When lots of PDFs get uploaded in a short window, S3 batches them
    // together into a single event.
    let record_count = event.records.len();
    let mut failed_jobs = 0;
    for record in event.records {
        let raw_key = record
            .s3
            .object
            .key
            .context("event record has no object key")?;
        let key = naming::decode_object_key(&raw_key)?;
        let job_id = naming::job_id_from_key(&key);

        match detector
            .start_text_detection(&config.bucket, &key, &job_id)
            .await?
        {
            Submission::Started {
                job_id: textract_job_id,
            } => {
                info!(
                    textract_job_id = %textract_job_id,
                    job_id = %job_id,
                    "Textract job started"
                );
            }
            Submission::Rejected { reason } => {
                warn!(job_id = %job_id, reason = %reason, "Textract rejected the document");
                failed_jobs += 1;
            }
        }

        // The listing is published even when Textract turns the document
        // down.
        publish_page_listing(&key, &job_id, storage, config).await?;
    }

    if failed_jobs > 0 {
        return Ok(HandlerResponse::ok(format!(
            "{failed_jobs} jobs were failed out of {record_count}!"
        )));
    }
    Ok(HandlerResponse::ok("Job(s) created successfully!"))
}

/// Render one document's pages and upload its listing of data URLs.
#[instrument(level = "debug", skip_all, fields(key = %key, job_id = %job_id))]
async fn publish_page_listing(
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

    // Encode every page as a data URL, in page order.
    let mut base64_urls = Vec::with_capacity(pages.len());
    for page in &pages {
        let bytes = tokio::fs::read(&page.path)
            .await
            .with_context(|| format!("failed to read {:?}", page.path.display()))?;
        base64_urls.push(pages::jpeg_data_url(&bytes));
    }

    let listing = PageListing { base64_urls };
    storage
        .upload_bytes(
            &config.bucket,
            &naming::page_listing_key(job_id),
            listing.to_json()?,
        )
        .await?;
    info!(
        job_id = %job_id,
        page_count = listing.base64_urls.len(),
        "Uploaded page listing"
    );

    // Clean up the scratch files.
    tokio::fs::remove_file(&pdf_path)
        .await
        .with_context(|| format!("failed to remove {:?}", pdf_path.display()))?;
    for page in &pages {
        tokio::fs::remove_file(&page.path)
            .await
            .with_context(|| format!("failed to remove {:?}", page.path.display()))?;
    }
    Ok(())
}
