//! Object keys and scratch-file paths.
//!
//! Every output location is derived from the input object's key, so
//! reprocessing the same upload overwrites its earlier outputs instead of
//! accumulating new ones.

use crate::prelude::*;

/// Prefix under which both functions write their page-image outputs.
const IMAGE_OUTPUT_PREFIX: &str = "pdf_to_images";

/// Prefix under which Textract writes its own result files. The `mds_job_`
/// segment namespaces each job's folder so downstream consumers can match
/// it to the submitting document.
const TEXTRACT_OUTPUT_PREFIX: &str = "textract_responses/mds_job_";

/// Decode an object key from an S3 notification record.
///
/// Notification payloads encode keys form-style: `+` is a space and `%XX`
/// escapes apply.
pub fn decode_object_key(raw: &str) -> Result<String> {
    let unplussed = raw.replace('+', " ");
    let decoded = urlencoding::decode(&unplussed)
        .with_context(|| format!("object key {raw:?} did not decode as UTF-8"))?;
    Ok(decoded.into_owned())
}

/// Derive the job identifier for a document: the final path segment of its
/// decoded key, with a trailing `.pdf` removed.
pub fn job_id_from_key(key: &str) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    let name = name.strip_suffix(".pdf").unwrap_or(name);
    name.to_owned()
}

/// The output key for one rendered page. Page numbers are 1-based and
/// zero-padded to three digits.
pub fn page_image_key(job_id: &str, page_number: usize) -> String {
    format!("{IMAGE_OUTPUT_PREFIX}/{job_id}/page{page_number:03}.jpeg")
}

/// The output key for a document's JSON page listing.
pub fn page_listing_key(job_id: &str) -> String {
    format!("{IMAGE_OUTPUT_PREFIX}/{job_id}.json")
}

/// The prefix Textract is told to write its result files under.
pub fn textract_output_prefix(job_id: &str) -> String {
    format!("{TEXTRACT_OUTPUT_PREFIX}{job_id}")
}

/// Scratch path for a downloaded PDF.
pub fn scratch_pdf_path(scratch_dir: &Path, job_id: &str) -> PathBuf {
    scratch_dir.join(format!("{job_id}.pdf"))
}

/// Scratch path for one rendered page, using the same numbering as
/// [`page_image_key`].
pub fn scratch_page_path(scratch_dir: &Path, job_id: &str, page_number: usize) -> PathBuf {
    scratch_dir.join(format!("page{page_number:03}-{job_id}.jpeg"))
}
