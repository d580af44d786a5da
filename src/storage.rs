//! Object storage shared by both Lambda functions.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use crate::prelude::*;

/// Where uploaded documents are read from and outputs written back to.
///
/// The handlers only ever talk to this trait, so tests can swap in an
/// in-memory implementation instead of a real bucket.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Download an object to a local file.
    async fn download_to(&self, bucket: &str, key: &str, dest: &Path) -> Result<()>;

    /// Upload a local file as an object.
    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;

    /// Upload an in-memory body as an object.
    async fn upload_bytes(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

/// [`Storage`] backed by the real S3 API.
pub struct S3 {
    client: aws_sdk_s3::Client,
}

impl S3 {
    /// Create a new client from shared AWS configuration.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl Storage for S3 {
    #[instrument(level = "debug", skip_all, fields(key = %key, dest = %dest.display()))]
    async fn download_to(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to get s3://{bucket}/{key}"))?;
        let mut body = object.body.into_async_read();
        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("failed to create {:?}", dest.display()))?;
        tokio::io::copy(&mut body, &mut file).await.with_context(|| {
            format!(
                "failed to write s3://{bucket}/{key} to {:?}",
                dest.display()
            )
        })?;
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(key = %key, path = %path.display()))]
    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("failed to open {:?}", path.display()))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .with_context(|| format!("failed to put s3://{bucket}/{key}"))?;
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(key = %key))]
    async fn upload_bytes(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("failed to put s3://{bucket}/{key}"))?;
        Ok(())
    }
}
