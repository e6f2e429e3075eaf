//! Configuration module
//!
//! Settings for the database pool, the object storage backend, pagination
//! bounds and log output. Values come from the process environment (a `.env`
//! file is honoured) with a default for everything except the database URL
//! and the public base URL used to build display URLs.

use std::env;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const LOCAL_STORAGE_PATH: &str = "./data/media";

/// Log output format for the tracing subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Parse `key` if set, otherwise use `default`. A value that is set but
/// does not parse is an error.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, LocalStack, ...)
    pub local_storage_path: String,
    /// Prefix for display URLs, e.g. a CDN origin. Keys are appended after a `/`.
    pub public_base_url: String,
    // Pagination
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests feed a map instead of
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };

        let config = Config {
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_or(&lookup, "DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,
            storage_backend,
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION").or_else(|| lookup("AWS_REGION")),
            s3_endpoint: lookup("S3_ENDPOINT").or_else(|| lookup("AWS_ENDPOINT_URL")),
            local_storage_path: lookup("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| LOCAL_STORAGE_PATH.to_string()),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .or_else(|| lookup("CDN_BASE_URL"))
                .map(|s| s.trim_end_matches('/').to_string())
                .ok_or_else(|| anyhow::anyhow!("PUBLIC_BASE_URL must be set"))?,
            default_page_size: parse_or(&lookup, "DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: parse_or(&lookup, "MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
            log_format: lookup("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(LogFormat::Pretty),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                return Err(anyhow::anyhow!("STORAGE_BACKEND=s3 requires S3_BUCKET"));
            }
            if self.s3_region.is_none() {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND=s3 requires S3_REGION or AWS_REGION"
                ));
            }
        }

        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_empty() {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH"
            ));
        }

        if self.max_page_size <= 0 {
            return Err(anyhow::anyhow!("MAX_PAGE_SIZE must be positive"));
        }

        if self.default_page_size <= 0 || self.default_page_size > self.max_page_size {
            return Err(anyhow::anyhow!(
                "DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE ({})",
                self.max_page_size
            ));
        }

        Ok(())
    }
}
