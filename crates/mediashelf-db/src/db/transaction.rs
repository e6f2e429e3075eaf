//! Database transaction utilities
//!
//! Multi-statement operations open a transaction with [`begin`], run their
//! statements against it, and hand the outcome to [`finish`], which commits on
//! success and rolls back on failure. Errors leaving `finish` have already
//! been classified with [`AppError::in_transaction`].

use mediashelf_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};

/// Begin a new database transaction
pub async fn begin(pool: &PgPool, operation: &str) -> Result<Transaction<'static, Postgres>, AppError> {
    pool.begin()
        .await
        .map_err(|e| AppError::from(e).in_transaction(format!("{}: begin", operation)))
}

/// Begin a read-only `REPEATABLE READ` transaction.
///
/// Every statement run on it sees the same snapshot, so a count and the page
/// it describes agree even while writers are active.
pub async fn begin_snapshot(
    pool: &PgPool,
    operation: &str,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = begin(pool, operation).await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from(e).in_transaction(format!("{}: snapshot", operation)))?;
    Ok(tx)
}

/// Commit if `result` is `Ok`, roll back otherwise.
///
/// A failed rollback is logged and the original error is returned; the
/// connection discards the transaction when it goes back to the pool.
pub async fn finish<T>(
    tx: Transaction<'static, Postgres>,
    result: Result<T, AppError>,
    operation: &str,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| AppError::from(e).in_transaction(format!("{}: commit", operation)))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(
                    error = %rollback_err,
                    operation,
                    "Failed to roll back transaction"
                );
            }
            tracing::debug!(error = %err.cause_chain(), operation, "Transaction rolled back");
            Err(err.in_transaction(operation))
        }
    }
}
