//! Rendering PDF pages to JPEG images using Poppler's `pdftocairo` CLI tool.

use std::{process::Output, sync::LazyLock};

use anyhow::anyhow;
use base64::{Engine as _, prelude::BASE64_STANDARD};
use regex::Regex;
use tokio::process::Command;

use crate::{naming, prelude::*};

/// The resolution used for rendered pages.
pub const RENDER_DPI: u32 = 200;

/// A default error regex for checking command output.
static ERROR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error").expect("failed to compile regex"));

static DOWNGRADE_TO_WARNING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)error: xref num").expect("failed to compile regex")
});

/// Does this line contain an error?
fn is_error_line(line: &str) -> bool {
    ERROR_REGEX.is_match(line) && !DOWNGRADE_TO_WARNING_REGEX.is_match(line)
}

/// One rendered page of a document, in its stable scratch location.
#[derive(Debug)]
pub struct RenderedPage {
    /// The 1-based page number, parsed from pdftocairo's output filename.
    pub number: usize,
    /// The rendered JPEG file.
    pub path: PathBuf,
}

/// Rasterize a PDF into one JPEG per page in `scratch_dir`, returning the
/// rendered pages in page order.
///
/// Raw outputs left behind by an earlier aborted run of the same job are
/// removed first, so only this run's pages are collected. The rendered
/// files are named `page<NNN>-<job_id>.jpeg`, so two jobs sharing a scratch
/// directory cannot collide. If `poppler_path` is `None`, the tool is
/// resolved from `$PATH` instead.
#[instrument(level = "debug", skip_all, fields(pdf_path = %pdf_path.display(), job_id))]
pub async fn rasterize_pdf(
    pdf_path: &Path,
    scratch_dir: &Path,
    job_id: &str,
    poppler_path: Option<&Path>,
) -> Result<Vec<RenderedPage>> {
    remove_stale_renders(scratch_dir, job_id).await?;

    // pdftocairo appends `-<page>` to this prefix, zero-padding the page
    // number to the width of the final page's number.
    let out_prefix = scratch_dir.join(job_id);
    let tool = match poppler_path {
        Some(dir) => dir.join("pdftocairo"),
        None => PathBuf::from("pdftocairo"),
    };
    let mut cmd = Command::new(&tool);
    cmd.arg("-jpeg").arg("-r").arg(RENDER_DPI.to_string());
    let output = cmd
        .arg(pdf_path)
        .arg(&out_prefix)
        .output()
        .await
        .with_context(|| format!("failed to run pdftocairo on {:?}", pdf_path.display()))?;
    check_for_command_failure("pdftocairo", &output, Some(&is_error_line))?;

    rename_rendered_pages(scratch_dir, job_id).await
}

/// Remove raw pdftocairo outputs for this job left behind by an earlier
/// invocation sharing the scratch directory.
///
/// A warm sandbox keeps its scratch filesystem between invocations, and an
/// aborted run skips cleanup, so such files can exist and would otherwise
/// be collected as pages of this run.
async fn remove_stale_renders(scratch_dir: &Path, job_id: &str) -> Result<()> {
    let mut entries = tokio::fs::read_dir(scratch_dir).await.with_context(|| {
        format!(
            "failed to read scratch directory {:?}",
            scratch_dir.display()
        )
    })?;
    while let Some(entry) = entries.next_entry().await.with_context(|| {
        format!(
            "failed to read entry in scratch directory {:?}",
            scratch_dir.display()
        )
    })? {
        let path = entry.path();
        if rendered_page_number(&path, job_id).is_some() {
            tokio::fs::remove_file(&path).await.with_context(|| {
                format!("failed to remove stale render {:?}", path.display())
            })?;
        }
    }
    Ok(())
}

/// Collect pdftocairo's numbered outputs and rename them to their stable
/// scratch names.
///
/// Because pdftocairo's zero padding depends on the page count, the raw
/// filenames do not sort lexically. We parse the page number out of each name
/// and sort numerically instead.
async fn rename_rendered_pages(scratch_dir: &Path, job_id: &str) -> Result<Vec<RenderedPage>> {
    let mut numbered = vec![];
    let mut entries = tokio::fs::read_dir(scratch_dir).await.with_context(|| {
        format!(
            "failed to read scratch directory {:?}",
            scratch_dir.display()
        )
    })?;
    while let Some(entry) = entries.next_entry().await.with_context(|| {
        format!(
            "failed to read entry in scratch directory {:?}",
            scratch_dir.display()
        )
    })? {
        let path = entry.path();
        if let Some(page_number) = rendered_page_number(&path, job_id) {
            numbered.push((page_number, path));
        }
    }
    if numbered.is_empty() {
        return Err(anyhow!("pdftocairo produced no pages for job {job_id:?}"));
    }
    numbered.sort_by_key(|&(page_number, _)| page_number);

    let mut renamed = Vec::with_capacity(numbered.len());
    for (page_number, path) in numbered {
        let dest = naming::scratch_page_path(scratch_dir, job_id, page_number);
        tokio::fs::rename(&path, &dest).await.with_context(|| {
            format!(
                "failed to rename {:?} to {:?}",
                path.display(),
                dest.display()
            )
        })?;
        renamed.push(RenderedPage {
            number: page_number,
            path: dest,
        });
    }
    Ok(renamed)
}

/// Parse the page number from a pdftocairo output filename of the form
/// `<job_id>-<page>.jpg`. Returns `None` for files that belong to another job.
fn rendered_page_number(path: &Path, job_id: &str) -> Option<usize> {
    let file_name = path.file_name()?.to_str()?;
    let digits = file_name
        .strip_suffix(".jpg")?
        .strip_prefix(job_id)?
        .strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Convert JPEG bytes to a `data:` URL.
pub fn jpeg_data_url(data: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(data))
}

/// Report any command failures, and include any error output.
///
/// The output of standard error and standard output will be logged at
/// appropriate levels. And standard error may be optionally checked line by
/// line to determine if the command failed despite exiting successfully.
fn check_for_command_failure(
    command_name: &str,
    output: &Output,
    is_error_line: Option<&dyn Fn(&str) -> bool>,
) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!(
        command_name = command_name,
        output = %stdout,
        "Standard output from command"
    );
    if !stderr.is_empty() {
        warn!(
            command_name = command_name,
            output = %stderr,
            "Standard error from command",
        );
    }

    if output.status.success() {
        if let Some(is_error_line) = is_error_line
            && stderr.lines().any(is_error_line)
        {
            return Err(anyhow!(
                "{} printed error output:\n{}",
                command_name,
                stderr,
            ));
        }
        Ok(())
    } else if let Some(exit_code) = output.status.code() {
        Err(anyhow!(
            "{} failed with exit code {} and error output:\n{}",
            command_name,
            exit_code,
            stderr,
        ))
    } else {
        Err(anyhow!(
            "{} failed with error output:\n{}",
            command_name,
            stderr,
        ))
    }
}
