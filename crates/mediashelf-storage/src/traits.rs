//! The object-storage capability the repositories depend on.

use crate::StorageBackend;
use async_trait::async_trait;
use mediashelf_core::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage misconfigured: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            // Rejected before any backend call: the caller sent a bad key.
            StorageError::InvalidKey(_) => AppError::InvalidInput(err.to_string()),
            _ => AppError::StorageUnavailable(err.to_string()),
        }
    }
}

/// Where media bytes live.
///
/// The repositories hold an `Arc<dyn Storage>` and never know which backend
/// sits behind it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key`, replacing any existing object.
    async fn upload(&self, storage_key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<()>;

    /// Remove the object stored under `storage_key`.
    ///
    /// Deleting a key that holds nothing succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Public URL for a key. Pure string work; never touches the backend.
    fn resolve(&self, storage_key: &str) -> String;

    fn backend_type(&self) -> StorageBackend;
}

/// Join a base URL and a key with exactly one `/` between them.
pub(crate) fn join_url(base_url: &str, storage_key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        storage_key.trim_start_matches('/')
    )
}
