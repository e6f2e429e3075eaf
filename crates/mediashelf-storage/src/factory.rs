//! Backend selection from configuration.

use mediashelf_core::Config;
use std::sync::Arc;

use crate::{Storage, StorageBackend, StorageError, StorageResult};

/// Build the backend named by `config.storage_backend`.
///
/// A backend whose cargo feature is disabled is a configuration error.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.storage_backend {
        StorageBackend::S3 => s3(config)?,
        StorageBackend::Local => local(config).await?,
    };

    tracing::info!(
        backend = %storage.backend_type(),
        public_base_url = %config.public_base_url,
        "Storage backend ready"
    );
    Ok(storage)
}

#[cfg(feature = "storage-s3")]
fn s3(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let missing = |name: &str| StorageError::ConfigError(format!("{} is required for the s3 backend", name));

    let bucket = config.s3_bucket.clone().ok_or_else(|| missing("S3_BUCKET"))?;
    let region = config.s3_region.clone().ok_or_else(|| missing("S3_REGION"))?;

    let storage = crate::S3Storage::new(
        bucket,
        region,
        config.s3_endpoint.clone(),
        config.public_base_url.clone(),
    )?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "storage-s3"))]
fn s3(_config: &Config) -> StorageResult<Arc<dyn Storage>> {
    Err(StorageError::ConfigError(
        "built without the storage-s3 feature".to_string(),
    ))
}

#[cfg(feature = "storage-local")]
async fn local(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage =
        crate::LocalStorage::new(&config.local_storage_path, config.public_base_url.clone()).await?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "storage-local"))]
async fn local(_config: &Config) -> StorageResult<Arc<dyn Storage>> {
    Err(StorageError::ConfigError(
        "built without the storage-local feature".to_string(),
    ))
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_backend_is_selected_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("media");
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/mediashelf".to_string()),
            "PUBLIC_BASE_URL" => Some("http://localhost:3000/media".to_string()),
            "LOCAL_STORAGE_PATH" => Some(path.display().to_string()),
            _ => None,
        })
        .unwrap();

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert_eq!(
            storage.resolve("audio/a.mp3"),
            "http://localhost:3000/media/audio/a.mp3"
        );
        assert!(path.is_dir());
    }
}
