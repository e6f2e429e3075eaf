//! S3-compatible backend built on `object_store`.
//!
//! Works against AWS as well as MinIO or LocalStack when an endpoint is
//! configured. Credentials are read from the usual `AWS_*` variables.

use crate::keys::validate_key;
use crate::traits::{join_url, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    /// Build a client for `bucket`.
    ///
    /// A plain `http://` endpoint enables unencrypted traffic, which local
    /// S3 emulators need.
    pub fn new(
        bucket: String,
        region: String,
        endpoint: Option<String>,
        public_base_url: String,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(&bucket);

        if let Some(endpoint) = endpoint {
            let plain_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(plain_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("bucket {}: {}", bucket, e)))?;

        Ok(Self {
            store,
            bucket,
            public_base_url,
        })
    }

    fn location(key: &str) -> StorageResult<Path> {
        validate_key(key)?;
        Ok(Path::from(key))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()> {
        let location = Self::location(key)?;
        let size = data.len();

        let mut attributes = Attributes::new();
        if !content_type.is_empty() {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let started = Instant::now();
        self.store
            .put_opts(&location, PutPayload::from(Bytes::from(data)), options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, size_bytes = size, "S3 upload failed");
                StorageError::UploadFailed(format!("{}: {}", key, e))
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = started.elapsed().as_millis() as u64,
            "Stored object in S3"
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = Self::location(key)?;
        let started = Instant::now();

        match self.store.delete(&location).await {
            Ok(()) => {}
            Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(bucket = %self.bucket, key = %key, "Object already absent");
                return Ok(());
            }
            Err(e) => {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 delete failed");
                return Err(StorageError::DeleteFailed(format!("{}: {}", key, e)));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = started.elapsed().as_millis() as u64,
            "Removed object from S3"
        );
        Ok(())
    }

    fn resolve(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
