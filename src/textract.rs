//! Submitting documents to AWS Textract for asynchronous text detection.

use async_trait::async_trait;
use aws_sdk_textract::{
    error::SdkError,
    types::{DocumentLocation, NotificationChannel, OutputConfig, S3Object},
};

use crate::{config::NotificationConfig, naming, prelude::*};

/// What happened when we asked Textract to process one document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Submission {
    /// Textract accepted the document and will process it in the background.
    Started {
        /// Textract's identifier for the new job.
        job_id: String,
    },
    /// Textract refused the document, for example because it is encrypted or
    /// larger than the service allows.
    Rejected {
        /// The service's explanation of the refusal.
        reason: String,
    },
}

/// Starts OCR jobs for documents already sitting in a bucket.
///
/// Like [`crate::storage::Storage`], this is a trait so the handlers can be
/// tested without calling the real service.
#[async_trait]
pub trait TextDetection: Send + Sync + 'static {
    /// Start an asynchronous text-detection job for one document.
    async fn start_text_detection(
        &self,
        bucket: &str,
        key: &str,
        job_id: &str,
    ) -> Result<Submission>;
}

/// [`TextDetection`] backed by the real Textract API.
pub struct Textract {
    client: aws_sdk_textract::Client,
    notification: NotificationConfig,
}

impl Textract {
    /// Create a new client from shared AWS configuration.
    pub fn new(config: &aws_config::SdkConfig, notification: NotificationConfig) -> Self {
        Self {
            client: aws_sdk_textract::Client::new(config),
            notification,
        }
    }
}

#[async_trait]
impl TextDetection for Textract {
    #[instrument(level = "debug", skip_all, fields(key = %key, job_id = %job_id))]
    async fn start_text_detection(
        &self,
        bucket: &str,
        key: &str,
        job_id: &str,
    ) -> Result<Submission> {
        let location = DocumentLocation::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();
        let output_config = OutputConfig::builder()
            .s3_bucket(bucket)
            .s3_prefix(naming::textract_output_prefix(job_id))
            .build()
            .context("failed to build Textract output config")?;
        let notification_channel = NotificationChannel::builder()
            .sns_topic_arn(&self.notification.topic_arn)
            .role_arn(&self.notification.role_arn)
            .build()
            .context("failed to build Textract notification channel")?;

        let response = self
            .client
            .start_document_text_detection()
            .document_location(location)
            .output_config(output_config)
            .notification_channel(notification_channel)
            .send()
            .await;
        match response {
            Ok(started) => {
                let job_id = started
                    .job_id()
                    .context("Textract did not return a job ID")?
                    .to_owned();
                Ok(Submission::Started { job_id })
            }
            // The service turning a document down is an answer, not an
            // infrastructure failure. Let the caller decide what to do.
            Err(SdkError::ServiceError(service_err)) => Ok(Submission::Rejected {
                reason: service_err.err().to_string(),
            }),
            Err(err) => Err(err)
                .with_context(|| format!("failed to call Textract for s3://{bucket}/{key}")),
        }
    }
}
