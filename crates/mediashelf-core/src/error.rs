//! Catalog errors
//!
//! Every repository and storage failure ends up as an [`AppError`]. Variants
//! name the caller-visible outcome, not the driver that produced it.
//! `From<sqlx::Error>` exists only with the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// SQLSTATE for `unique_violation`.
#[cfg(feature = "sqlx")]
const PG_UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for `foreign_key_violation`.
#[cfg(feature = "sqlx")]
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Severity a caller should log an error at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected outcomes: bad input, missing rows.
    Debug,
    /// Lost races the caller may retry.
    Warn,
    Error,
}

/// How a failure is rendered by a transport layered over the repositories.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable upper-case code, e.g. `NOT_FOUND`.
    fn error_code(&self) -> &'static str;

    /// True when retrying the same call may succeed.
    fn is_recoverable(&self) -> bool;

    /// Message safe to show outside the process.
    fn client_message(&self) -> String;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Transaction failed: {message}")]
    TransactionFailed {
        message: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a failure raised while a multi-statement unit of work was open.
    ///
    /// Domain failures detected inside the transaction (missing tag, missing
    /// media, storage outage) keep their own kind; only raw store failures are
    /// reported as a rolled back transaction.
    pub fn in_transaction(self, message: impl Into<String>) -> AppError {
        match self {
            AppError::NotFound(_)
            | AppError::Duplicate(_)
            | AppError::InvalidReference(_)
            | AppError::StorageUnavailable(_)
            | AppError::InvalidInput(_)
            | AppError::TransactionFailed { .. } => self,
            other => AppError::TransactionFailed {
                message: message.into(),
                source: Box::new(other),
            },
        }
    }

    /// This error followed by each `source`, outermost first.
    pub fn cause_chain(&self) -> String {
        use std::error::Error;

        std::iter::successors(Some(self as &dyn Error), |err| (*err).source())
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join(": ")
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::RowNotFound = err {
            return AppError::NotFound("Row not found".to_string());
        }

        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());

        match code.as_deref() {
            Some(PG_UNIQUE_VIOLATION) => AppError::ConstraintViolation(err.to_string()),
            Some(PG_FOREIGN_KEY_VIOLATION) => AppError::InvalidReference(err.to_string()),
            _ => AppError::Database(err),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("I/O failure: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

// (status, code, recoverable, level)
fn metadata_of(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, LogLevel::Error),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::Duplicate(_) => (409, "DUPLICATE", false, LogLevel::Debug),
        AppError::InvalidReference(_) => (422, "INVALID_REFERENCE", false, LogLevel::Debug),
        AppError::ConstraintViolation(_) => (409, "CONSTRAINT_VIOLATION", true, LogLevel::Warn),
        AppError::StorageUnavailable(_) => (503, "STORAGE_UNAVAILABLE", true, LogLevel::Error),
        AppError::TransactionFailed { .. } => (500, "TRANSACTION_FAILED", true, LogLevel::Error),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        metadata_of(self).0
    }

    fn error_code(&self) -> &'static str {
        metadata_of(self).1
    }

    fn is_recoverable(&self) -> bool {
        metadata_of(self).2
    }

    fn log_level(&self) -> LogLevel {
        metadata_of(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Duplicate(ref msg) => msg.clone(),
            AppError::InvalidReference(ref msg) => msg.clone(),
            AppError::ConstraintViolation(_) => {
                "The request conflicted with a concurrent change".to_string()
            }
            AppError::StorageUnavailable(_) => "Failed to access object storage".to_string(),
            AppError::TransactionFailed { .. } => "The operation was rolled back".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Tag not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Tag not found");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_duplicate() {
        let err = AppError::Duplicate("Tag 'sunset' already exists".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "DUPLICATE");
        assert!(err.client_message().contains("sunset"));
    }

    #[test]
    fn test_error_metadata_storage_unavailable_hides_details() {
        let err = AppError::StorageUnavailable("bucket timeout at 10.0.0.3".to_string());
        assert_eq!(err.http_status_code(), 503);
        assert!(err.is_recoverable());
        assert!(!err.client_message().contains("10.0.0.3"));
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_pool_closed_maps_to_database() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_in_transaction_keeps_domain_failures() {
        let err = AppError::InvalidReference("Tag 42 does not exist".to_string())
            .in_transaction("create media");
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[test]
    fn test_in_transaction_wraps_store_failures() {
        let err = AppError::ConstraintViolation("media_tag_pkey".to_string())
            .in_transaction("create media");
        match err {
            AppError::TransactionFailed { message, source } => {
                assert_eq!(message, "create media");
                assert!(matches!(*source, AppError::ConstraintViolation(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cause_chain_walks_sources() {
        let err = AppError::Internal("disk full".to_string()).in_transaction("delete media");
        assert_eq!(
            err.cause_chain(),
            "Transaction failed: delete media: Internal error: disk full"
        );
    }
}
