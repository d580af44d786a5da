//! In-memory stand-ins shared by the handler tests.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Mutex,
};

use anyhow::anyhow;
use async_trait::async_trait;
use aws_lambda_events::event::s3::{S3Bucket, S3Entity, S3Event, S3EventRecord, S3Object};

use crate::{
    config::Config,
    prelude::*,
    storage::Storage,
    textract::{Submission, TextDetection},
};

/// A [`Config`] pointing at a throwaway scratch directory, with Poppler
/// resolved from `$PATH`.
pub fn test_config(scratch_dir: &Path) -> Config {
    Config {
        bucket: "test-bucket".to_owned(),
        poppler_path: None,
        scratch_dir: scratch_dir.to_owned(),
    }
}

/// Build an event naming one object per key, the way S3 batches uploads.
pub fn s3_event(keys: &[&str]) -> S3Event {
    S3Event {
        records: keys
            .iter()
            .map(|key| S3EventRecord {
                s3: S3Entity {
                    bucket: S3Bucket {
                        name: Some("test-bucket".to_owned()),
                        ..Default::default()
                    },
                    object: S3Object {
                        key: Some((*key).to_owned()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect(),
    }
}

/// [`Storage`] backed by a map instead of a bucket.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Seed an object, builder style.
    pub fn with_object(self, bucket: &str, key: &str, body: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(object_id(bucket, key), body.to_vec());
        self
    }

    /// Seed an object from a fixture file, builder style.
    pub fn with_fixture(self, bucket: &str, key: &str, fixture: &str) -> Result<Self> {
        let body = std::fs::read(fixture)
            .with_context(|| format!("failed to read fixture {fixture:?}"))?;
        Ok(self.with_object(bucket, key, &body))
    }

    /// The body of one stored object, if any.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&object_id(bucket, key))
            .cloned()
    }

    /// Every stored object's `s3://` identifier, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

fn object_id(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn download_to(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let body = self
            .object(bucket, key)
            .ok_or_else(|| anyhow!("no such object s3://{bucket}/{key}"))?;
        tokio::fs::write(dest, body)
            .await
            .with_context(|| format!("failed to write {:?}", dest.display()))?;
        Ok(())
    }

    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {:?}", path.display()))?;
        self.objects
            .lock()
            .unwrap()
            .insert(object_id(bucket, key), body);
        Ok(())
    }

    async fn upload_bytes(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(object_id(bucket, key), body);
        Ok(())
    }
}

/// [`TextDetection`] that answers from a script instead of calling AWS.
pub struct ScriptedTextract {
    script: Mutex<VecDeque<Result<Submission>>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedTextract {
    /// One scripted outcome per expected call, in order.
    pub fn new(script: Vec<Result<Submission>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(vec![]),
        }
    }

    /// The `(bucket, key, job_id)` triples submitted so far.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextDetection for ScriptedTextract {
    async fn start_text_detection(
        &self,
        bucket: &str,
        key: &str,
        job_id: &str,
    ) -> Result<Submission> {
        self.calls.lock().unwrap().push((
            bucket.to_owned(),
            key.to_owned(),
            job_id.to_owned(),
        ));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .context("ran out of scripted Textract outcomes")?
    }
}
