//! Runtime configuration for both functions.
//!
//! The deployment fixes all of this through Lambda environment variables;
//! nothing here changes between invocations. Handlers receive these structs
//! explicitly so tests can build them by hand.

use std::env;

use crate::prelude::*;

/// Where the Lambda layer installs the Poppler command-line tools.
const DEFAULT_POPPLER_PATH: &str = "/opt/bin";

/// Settings shared by both functions.
#[derive(Clone, Debug)]
pub struct Config {
    /// The bucket holding input PDFs and all derived outputs.
    pub bucket: String,

    /// Directory containing the Poppler executables. `None` means "search
    /// `$PATH`", which is what local runs and tests want.
    pub poppler_path: Option<PathBuf>,

    /// Directory for per-invocation scratch files (`/tmp` on Lambda).
    pub scratch_dir: PathBuf,
}

impl Config {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let bucket = env::var("BUCKET_NAME").context("BUCKET_NAME must be set")?;
        let poppler_path = env::var("POPPLER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_POPPLER_PATH));
        Ok(Self {
            bucket,
            poppler_path: Some(poppler_path),
            scratch_dir: env::temp_dir(),
        })
    }
}

/// Completion-notification settings for text-detection jobs.
///
/// Only the `ocr-submitter` function needs these.
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// The SNS topic Textract notifies when a job finishes.
    pub topic_arn: String,

    /// The IAM role Textract assumes to publish to that topic.
    pub role_arn: String,
}

impl NotificationConfig {
    /// Build the notification settings from environment variables.
    pub fn from_env() -> Result<Self> {
        let topic_arn = env::var("SNS_TOPIC_ARN").context("SNS_TOPIC_ARN must be set")?;
        let role_arn = env::var("SNS_ROLE_ARN").context("SNS_ROLE_ARN must be set")?;
        Ok(Self {
            topic_arn,
            role_arn,
        })
    }
}
