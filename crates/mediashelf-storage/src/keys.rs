//! Shared key generation for storage backends.
//!
//! Key format: `images/{uuid}{ext}` for images, `audio/{uuid}{ext}` for audio.

use mediashelf_core::models::MediaKind;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Generate a fresh storage key for an upload of the given kind.
///
/// `extension` may be given with or without its leading dot, or empty.
/// Video has no stored object and is rejected.
pub fn object_key(kind: MediaKind, extension: &str) -> StorageResult<String> {
    let prefix = match kind {
        MediaKind::Image => "images",
        MediaKind::Audio => "audio",
        MediaKind::Video => {
            return Err(StorageError::InvalidKey(
                "video media are not stored in object storage".to_string(),
            ))
        }
    };

    let ext = extension.trim().trim_start_matches('.').to_lowercase();
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidKey(format!(
            "unsupported file extension: {}",
            extension
        )));
    }

    let key = if ext.is_empty() {
        format!("{}/{}", prefix, Uuid::new_v4())
    } else {
        format!("{}/{}.{}", prefix, Uuid::new_v4(), ext)
    };
    Ok(key)
}

/// Reject keys that could escape the storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            storage_key
        )));
    }
    Ok(())
}
