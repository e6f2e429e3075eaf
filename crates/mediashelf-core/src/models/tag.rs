use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::validation::validate_not_blank;

/// Media kinds a tag is meant for.
///
/// Informational only: linking a `Video` tag to an image is accepted, and
/// changing the scope never re-checks existing associations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "tag_scope", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum TagScope {
    #[default]
    All,
    Image,
    Audio,
    Video,
}

/// Tag model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Tag {
    pub id: Uuid,
    #[validate(
        length(max = 255, message = "Tag name must be at most 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    pub applies_to: TagScope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a tag
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTag {
    #[validate(
        length(max = 255, message = "Tag name must be at most 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[serde(default)]
    pub applies_to: Option<TagScope>,
}

impl NewTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            applies_to: None,
        }
    }

    pub fn with_scope(mut self, applies_to: TagScope) -> Self {
        self.applies_to = Some(applies_to);
        self
    }

    /// Scope to persist; unspecified means `All`.
    pub fn scope(&self) -> TagScope {
        self.applies_to.unwrap_or_default()
    }
}
