//! Mediashelf Core Library
//!
//! This crate provides the domain models, error types, configuration and the
//! pure scheduling rules that are shared across all Mediashelf components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod pagination;
pub mod schedule;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::{Config, LogFormat};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use pagination::{PageRequest, Paged};
pub use schedule::Window;
pub use storage_types::StorageBackend;
