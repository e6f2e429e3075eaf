//! Shared constants

use uuid::Uuid;

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound for any paginated listing.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Longest accepted title (media, todo) or tag name, in characters.
pub const MAX_NAME_LENGTH: u64 = 255;

/// Built-in tag applied to images, created by the seeding step.
pub const BUILTIN_IMAGE_TAG_ID: Uuid = Uuid::from_u128(1);

/// Built-in tag applied to videos, created by the seeding step.
pub const BUILTIN_VIDEO_TAG_ID: Uuid = Uuid::from_u128(2);
