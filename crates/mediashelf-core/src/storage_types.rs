//! Object storage backend selector

use std::fmt;
use std::str::FromStr;

/// Which object store holds image and audio bytes.
///
/// Lives in core because configuration parses it and the storage crate
/// reports it back from `Storage::backend_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Local => "local",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        [StorageBackend::S3, StorageBackend::Local]
            .into_iter()
            .find(|backend| backend.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown storage backend '{}' (expected s3 or local)", s))
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
