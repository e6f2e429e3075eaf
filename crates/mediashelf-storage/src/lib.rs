//! Mediashelf Storage Library
//!
//! Object storage for uploaded image and audio payloads. The catalog only
//! needs three things from a backend: put bytes under a key, remove a key,
//! and turn a key into the URL clients fetch it from.
//!
//! # Storage key format
//!
//! - **Images**: `images/{uuid}.{ext}`
//! - **Audio**: `audio/{uuid}.{ext}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{object_key, validate_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use mediashelf_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
