//! Filesystem backend
//!
//! Objects live at `{root}/{key}`. Uploads land in a sibling `.partial` file
//! that is renamed into place, so readers never see a half-written object.

use crate::keys::validate_key;
use crate::traits::{join_url, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Instant;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    /// Open (creating if needed) the directory objects are stored under.
    ///
    /// `public_base_url` is whatever serves that directory, e.g.
    /// `http://localhost:3000/media`.
    pub async fn new(root: impl Into<PathBuf>, public_base_url: String) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!("cannot create {}: {}", root.display(), e))
        })?;

        Ok(Self {
            root,
            public_base_url,
        })
    }

    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<()> {
        let target = self.object_path(key)?;
        let partial = target.with_extension("partial");
        let size = data.len();
        let started = Instant::now();

        let write = async {
            if let Some(dir) = target.parent() {
                fs::create_dir_all(dir).await?;
            }
            fs::write(&partial, &data).await?;
            fs::rename(&partial, &target).await
        };

        if let Err(e) = write.await {
            tracing::error!(error = %e, key = %key, "Local upload failed");
            // The partial file may not exist; nothing to report if so.
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::UploadFailed(format!("{}: {}", key, e)));
        }

        tracing::info!(
            key = %key,
            size_bytes = size,
            duration_ms = started.elapsed().as_millis() as u64,
            "Stored object on local disk"
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.object_path(key)?;
        let started = Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    key = %key,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Removed object from local disk"
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(key = %key, "Object already absent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Local delete failed");
                Err(StorageError::DeleteFailed(format!("{}: {}", key, e)))
            }
        }
    }

    fn resolve(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/media/".to_string())
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn upload_writes_file_under_key() {
        let (dir, storage) = storage().await;

        storage
            .upload("images/cat.png", b"png-bytes".to_vec(), "image/png")
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("images/cat.png")).unwrap();
        assert_eq!(written, b"png-bytes");
        assert!(!dir.path().join("images/cat.partial").exists());
    }

    #[tokio::test]
    async fn delete_removes_file_and_tolerates_absence() {
        let (dir, storage) = storage().await;
        storage
            .upload("audio/song.mp3", vec![1, 2, 3], "audio/mpeg")
            .await
            .unwrap();

        storage.delete("audio/song.mp3").await.unwrap();
        assert!(!dir.path().join("audio/song.mp3").exists());

        storage.delete("audio/song.mp3").await.unwrap();
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (_dir, storage) = storage().await;
        let err = storage
            .upload("../escape.png", vec![0], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn resolve_joins_base_url() {
        let (_dir, storage) = storage().await;
        assert_eq!(
            storage.resolve("images/cat.png"),
            "http://localhost:3000/media/images/cat.png"
        );
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
