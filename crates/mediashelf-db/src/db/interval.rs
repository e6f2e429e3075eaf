//! Window queries over todos
//!
//! SQL counterpart of `mediashelf_core::schedule`. A pending todo is in a
//! window when its period overlaps it or its due date falls inside it, both
//! bounds inclusive.

use mediashelf_core::models::Todo;
use mediashelf_core::{AppError, PageRequest, Paged, Window};
use sqlx::{PgPool, Postgres};

use super::transaction;

const TODO_COLUMNS: &str =
    "id, title, description, start_date, end_date, due_date, completed, created_at, updated_at";

/// `$1` is the window start, `$2` the window end.
const IN_WINDOW: &str = r#"
    (
        (start_date IS NOT NULL AND end_date IS NOT NULL AND start_date <= $2 AND end_date >= $1)
        OR (due_date IS NOT NULL AND due_date >= $1 AND due_date <= $2)
    )
    AND completed = FALSE
"#;

/// LEAST skips NULLs, so this is whichever of the two dates is set, or the
/// earlier when both are.
const BY_ANCHOR: &str = "LEAST(start_date, due_date) ASC, created_at ASC, id ASC";

const UNSCHEDULED: &str =
    "start_date IS NULL AND end_date IS NULL AND due_date IS NULL AND completed = FALSE";

/// Pending todos overlapping `window`, earliest anchor first.
#[tracing::instrument(skip(pool), fields(db.table = "todo", db.operation = "select", window.start = %window.start(), window.end = %window.end()))]
pub async fn find_in_window(pool: &PgPool, window: &Window) -> Result<Vec<Todo>, AppError> {
    let sql = format!(
        "SELECT {} FROM todo WHERE {} ORDER BY {}",
        TODO_COLUMNS, IN_WINDOW, BY_ANCHOR
    );

    let todos = sqlx::query_as::<Postgres, Todo>(&sql)
        .bind(window.start())
        .bind(window.end())
        .fetch_all(pool)
        .await?;

    Ok(todos)
}

/// Pending todos with neither a period nor a due date, newest first.
#[tracing::instrument(skip(pool), fields(db.table = "todo", db.operation = "select", offset = page.offset(), limit = page.limit()))]
pub async fn find_without_due_date(
    pool: &PgPool,
    page: PageRequest,
) -> Result<Paged<Todo>, AppError> {
    let count_sql = format!("SELECT COUNT(*) FROM todo WHERE {}", UNSCHEDULED);
    let sql = format!(
        "SELECT {} FROM todo WHERE {} ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        TODO_COLUMNS, UNSCHEDULED
    );

    let mut tx = transaction::begin_snapshot(pool, "list unscheduled todos").await?;
    let result = async {
        let total_count: i64 = sqlx::query_scalar(&count_sql).fetch_one(&mut *tx).await?;
        let todos = sqlx::query_as::<Postgres, Todo>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;
        Ok::<_, AppError>(Paged::new(todos, total_count, page))
    }
    .await;
    transaction::finish(tx, result, "list unscheduled todos").await
}
