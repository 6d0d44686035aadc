use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Builder as S3ConfigBuilder, Client as S3Client};
use thiserror::Error;

use crate::core::config::DriveConfig;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("object already exists at {0}")]
    AlreadyExists(String),
    #[error("upload failed: {0}")]
    Upload(String),
}

/// Blob storage consumed by the profile photo flow. Uploads complete
/// before the owning record save; a failed upload aborts the save.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> Result<(), BlobError>;

    fn public_url(&self, path: &str) -> String;
}

/// S3-compatible drive (MinIO in development), path-style addressing with
/// static credentials.
pub struct S3BlobStore {
    client: S3Client,
    endpoint: String,
    bucket: String,
}

impl S3BlobStore {
    pub async fn init(config: &DriveConfig) -> Result<Self, BlobError> {
        let endpoint = config.server.trim_end_matches('/').to_string();
        let base_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(format!("{endpoint}/"))
            .region("auto")
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "static",
            ))
            .load()
            .await;
        let s3_config = S3ConfigBuilder::from(&base_config)
            .force_path_style(true)
            .build();
        Ok(Self {
            client: S3Client::from_conf(s3_config),
            endpoint,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> Result<(), BlobError> {
        if !overwrite {
            let head = self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(path)
                .send()
                .await;
            if head.is_ok() {
                return Err(BlobError::AlreadyExists(path.to_string()));
            }
        }
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .body(bytes.into())
            .send()
            .await
            .map_err(|e| BlobError::Upload(e.to_string()))?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, path)
    }
}

/// In-memory blob store for tests. `fail_uploads` simulates a drive
/// outage so the abort-on-upload-failure path can be exercised.
pub struct MemBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_uploads: AtomicBool,
}

impl MemBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }
}

impl Default for MemBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        overwrite: bool,
    ) -> Result<(), BlobError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(BlobError::Upload("simulated drive outage".to_string()));
        }
        let mut objects = self.objects.lock().unwrap();
        if !overwrite && objects.contains_key(path) {
            return Err(BlobError::AlreadyExists(path.to_string()));
        }
        objects.insert(path.to_string(), bytes);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("mem://{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overwrite_false_rejects_existing_object() {
        let store = MemBlobStore::new();
        store.upload("avatars/x", vec![1], "image/png", true).await.unwrap();
        let err = store
            .upload("avatars/x", vec![2], "image/png", false)
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn failing_store_uploads_nothing() {
        let store = MemBlobStore::new();
        store.fail_uploads.store(true, Ordering::SeqCst);
        assert!(store.upload("a", vec![1], "image/png", true).await.is_err());
        assert!(!store.contains("a"));
    }
}
