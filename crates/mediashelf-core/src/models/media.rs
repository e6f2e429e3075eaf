use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::tag::Tag;
use super::validation::{rule, validate_not_blank};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "wave"];
const AUDIO_CONTENT_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/wave",
    "audio/x-wav",
];

/// Media kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_kind", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Image and audio payloads live in object storage; video is a link.
    pub fn is_storage_backed(&self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Audio)
    }

    /// Decide whether an uploaded file is audio or an image.
    ///
    /// Uploads are never video: videos are registered by external URL.
    pub fn classify_upload(extension: &str, content_type: &str) -> MediaKind {
        let ext = extension.trim_start_matches('.').to_lowercase();
        let content_type = content_type.trim().to_lowercase();

        if AUDIO_EXTENSIONS.contains(&ext.as_str())
            || AUDIO_CONTENT_TYPES.contains(&content_type.as_str())
        {
            MediaKind::Audio
        } else {
            MediaKind::Image
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Catalogued media item with its tags.
///
/// `display_url` is derived from `storage_key` on every read and is never
/// written back to the store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_media_locator"))]
pub struct Media {
    pub id: Uuid,
    pub kind: MediaKind,
    pub storage_key: Option<String>,
    pub external_url: Option<String>,
    pub display_url: Option<String>,
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn is_audio(&self) -> bool {
        self.kind == MediaKind::Audio
    }

    /// Storage key of the backing object, if this kind has one.
    pub fn object_key(&self) -> Option<&str> {
        if self.kind.is_storage_backed() {
            self.storage_key.as_deref()
        } else {
            None
        }
    }

    pub fn tag_ids(&self) -> Vec<Uuid> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

fn validate_media_locator(media: &Media) -> Result<(), ValidationError> {
    check_locator(
        media.kind,
        media.storage_key.as_deref(),
        media.external_url.as_deref(),
    )
}

/// The kind decides which locator is populated; the other must be absent.
fn check_locator(
    kind: MediaKind,
    storage_key: Option<&str>,
    external_url: Option<&str>,
) -> Result<(), ValidationError> {
    let present = |v: Option<&str>| v.map(|s| !s.trim().is_empty()).unwrap_or(false);

    match kind {
        MediaKind::Image | MediaKind::Audio => {
            if !present(storage_key) {
                return Err(rule(
                    "missing_storage_key",
                    "image and audio media require a storage key",
                ));
            }
            if external_url.is_some() {
                return Err(rule(
                    "unexpected_external_url",
                    "image and audio media must not carry an external URL",
                ));
            }
        }
        MediaKind::Video => {
            if !present(external_url) {
                return Err(rule(
                    "missing_external_url",
                    "video media require an external URL",
                ));
            }
            if storage_key.is_some() {
                return Err(rule(
                    "unexpected_storage_key",
                    "video media must not carry a storage key",
                ));
            }
        }
    }
    Ok(())
}

/// Database row for the `media` table (tags and display URL live elsewhere).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct MediaRow {
    pub id: Uuid,
    pub kind: MediaKind,
    pub storage_key: Option<String>,
    pub external_url: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaRow {
    pub fn into_media(self, tags: Vec<Tag>, display_url: Option<String>) -> Media {
        Media {
            id: self.id,
            kind: self.kind,
            storage_key: self.storage_key,
            external_url: self.external_url,
            display_url,
            title: self.title,
            description: self.description,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Where the content of a new media item lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaSource {
    Image { storage_key: String },
    Audio { storage_key: String },
    Video { external_url: String },
}

impl MediaSource {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaSource::Image { .. } => MediaKind::Image,
            MediaSource::Audio { .. } => MediaKind::Audio,
            MediaSource::Video { .. } => MediaKind::Video,
        }
    }

    pub fn storage_key(&self) -> Option<&str> {
        match self {
            MediaSource::Image { storage_key } | MediaSource::Audio { storage_key } => {
                Some(storage_key)
            }
            MediaSource::Video { .. } => None,
        }
    }

    pub fn external_url(&self) -> Option<&str> {
        match self {
            MediaSource::Video { external_url } => Some(external_url),
            _ => None,
        }
    }

    /// Build a storage-backed source for an already uploaded object.
    ///
    /// Returns `None` for `MediaKind::Video`, which has no object.
    pub fn stored(kind: MediaKind, storage_key: String) -> Option<Self> {
        match kind {
            MediaKind::Image => Some(MediaSource::Image { storage_key }),
            MediaKind::Audio => Some(MediaSource::Audio { storage_key }),
            MediaKind::Video => None,
        }
    }
}

/// Request DTO for creating media
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_new_media_source"))]
pub struct NewMedia {
    pub source: MediaSource,
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

impl NewMedia {
    pub fn new(source: MediaSource, title: impl Into<String>) -> Self {
        Self {
            source,
            title: title.into(),
            description: None,
            tag_ids: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }

    /// Tag ids with duplicates removed, first occurrence kept.
    pub fn unique_tag_ids(&self) -> Vec<Uuid> {
        let mut seen = std::collections::HashSet::new();
        self.tag_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

fn validate_new_media_source(media: &NewMedia) -> Result<(), ValidationError> {
    check_locator(
        media.source.kind(),
        media.source.storage_key(),
        media.source.external_url(),
    )
}
