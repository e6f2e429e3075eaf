use chrono::{NaiveDate, Utc};
use mediashelf_core::models::{NewTodo, Todo};
use mediashelf_core::{AppError, PageRequest, Paged, Window};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;

use super::interval;
use super::transaction;

const TODO_COLUMNS: &str =
    "id, title, description, start_date, end_date, due_date, completed, created_at, updated_at";

/// Todo repository
#[derive(Clone)]
pub struct TodoRepository {
    pool: PgPool,
}

impl TodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, new), fields(db.table = "todo", db.operation = "insert"))]
    pub async fn create(&self, new: NewTodo) -> Result<Todo, AppError> {
        new.validate()?;

        let now = Utc::now();
        let todo = sqlx::query_as::<Postgres, Todo>(&format!(
            r#"
            INSERT INTO todo (
                id, title, description, start_date, end_date, due_date, completed, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8)
            RETURNING {}
            "#,
            TODO_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new.title.trim())
        .bind(new.description.as_deref())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.due_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(todo_id = %todo.id, "Todo created");
        Ok(todo)
    }

    #[tracing::instrument(skip(self), fields(db.table = "todo", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<Postgres, Todo>(&format!(
            "SELECT {} FROM todo WHERE id = $1",
            TODO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    /// Every todo, newest first.
    #[tracing::instrument(skip(self), fields(db.table = "todo", db.operation = "select"))]
    pub async fn find_all(&self) -> Result<Vec<Todo>, AppError> {
        let todos = sqlx::query_as::<Postgres, Todo>(&format!(
            "SELECT {} FROM todo ORDER BY created_at DESC, id DESC",
            TODO_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "todo", db.operation = "select", offset = page.offset(), limit = page.limit()))]
    pub async fn find_all_paginated(&self, page: PageRequest) -> Result<Paged<Todo>, AppError> {
        self.find_all_filtered(page, None).await
    }

    /// Newest first, optionally narrowed to completed or pending todos.
    #[tracing::instrument(skip(self), fields(db.table = "todo", db.operation = "select", offset = page.offset(), limit = page.limit()))]
    pub async fn find_all_filtered(
        &self,
        page: PageRequest,
        completed: Option<bool>,
    ) -> Result<Paged<Todo>, AppError> {
        let mut tx = transaction::begin_snapshot(&self.pool, "list todos").await?;
        let result = async {
            // NULL matches every row.
            let total_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM todo WHERE ($1::boolean IS NULL OR completed = $1)",
            )
            .bind(completed)
            .fetch_one(&mut *tx)
            .await?;

            let todos = sqlx::query_as::<Postgres, Todo>(&format!(
                "SELECT {} FROM todo WHERE ($1::boolean IS NULL OR completed = $1) ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
                TODO_COLUMNS
            ))
            .bind(completed)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;

            Ok::<_, AppError>(Paged::new(todos, total_count, page))
        }
        .await;
        transaction::finish(tx, result, "list todos").await
    }

    /// Pending todos whose period or due date touches `window`.
    pub async fn find_by_date_range(&self, window: &Window) -> Result<Vec<Todo>, AppError> {
        interval::find_in_window(&self.pool, window).await
    }

    /// Pending todos scheduled on the given UTC day.
    pub async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Todo>, AppError> {
        interval::find_in_window(&self.pool, &Window::day(date)).await
    }

    /// Pending todos with no period and no due date.
    pub async fn find_without_due_date(&self, page: PageRequest) -> Result<Paged<Todo>, AppError> {
        interval::find_without_due_date(&self.pool, page).await
    }

    /// Overwrite every stored field of `todo`.
    #[tracing::instrument(skip(self, todo), fields(db.table = "todo", db.operation = "update", db.record_id = %todo.id))]
    pub async fn update(&self, todo: &Todo) -> Result<Todo, AppError> {
        todo.validate()?;

        let updated = sqlx::query_as::<Postgres, Todo>(&format!(
            r#"
            UPDATE todo
            SET title = $2, description = $3, start_date = $4, end_date = $5, due_date = $6,
                completed = $7, updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            TODO_COLUMNS
        ))
        .bind(todo.id)
        .bind(todo.title.trim())
        .bind(todo.description.as_deref())
        .bind(todo.start_date)
        .bind(todo.end_date)
        .bind(todo.due_date)
        .bind(todo.completed)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Todo {} not found", todo.id)))
    }

    /// Flip the completion flag without touching the other fields.
    #[tracing::instrument(skip(self), fields(db.table = "todo", db.operation = "update", db.record_id = %id))]
    pub async fn set_completed(&self, id: Uuid, completed: bool) -> Result<Todo, AppError> {
        let mut todo = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Todo {} not found", id)))?;
        todo.completed = completed;
        self.update(&todo).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "todo", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM todo WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Todo {} not found", id)));
        }
        Ok(())
    }
}
