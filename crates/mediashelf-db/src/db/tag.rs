use chrono::Utc;
use mediashelf_core::models::{NewTag, Tag};
use mediashelf_core::{AppError, PageRequest, Paged};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use super::association;
use super::query::escape_like;
use super::transaction;

const TAG_COLUMNS: &str = "id, name, applies_to, created_at, updated_at";

/// Tag repository
///
/// Names are unique and compared case-sensitively. `applies_to` is stored
/// as given and never checked against the media a tag is linked to.
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a tag, rejecting a taken name with `Duplicate`.
    ///
    /// The name is checked first; a concurrent insert of the same name that
    /// slips past the check is caught by the unique constraint.
    #[tracing::instrument(skip(self, new), fields(db.table = "tag", db.operation = "insert", tag_name = %new.name))]
    pub async fn create(&self, new: NewTag) -> Result<Tag, AppError> {
        new.validate()?;
        let name = new.name.trim();

        if self.find_by_name(name).await?.is_some() {
            return Err(AppError::Duplicate(format!("Tag '{}' already exists", name)));
        }

        let now = Utc::now();
        let tag = sqlx::query_as::<Postgres, Tag>(&format!(
            r#"
            INSERT INTO tag (id, name, applies_to, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TAG_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(new.scope())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::ConstraintViolation(_) => {
                AppError::Duplicate(format!("Tag '{}' already exists", name))
            }
            other => other,
        })?;

        tracing::info!(tag_id = %tag.id, "Tag created");
        Ok(tag)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tag", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>, AppError> {
        let tag = sqlx::query_as::<Postgres, Tag>(&format!(
            "SELECT {} FROM tag WHERE id = $1",
            TAG_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tag)
    }

    /// Exact, case-sensitive name lookup.
    #[tracing::instrument(skip(self), fields(db.table = "tag", db.operation = "select"))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, AppError> {
        let tag = sqlx::query_as::<Postgres, Tag>(&format!(
            "SELECT {} FROM tag WHERE name = $1",
            TAG_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tag)
    }

    /// All tags ordered by name.
    #[tracing::instrument(skip(self), fields(db.table = "tag", db.operation = "select"))]
    pub async fn find_all(&self) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<Postgres, Tag>(&format!(
            "SELECT {} FROM tag ORDER BY name, id",
            TAG_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    pub async fn find_all_paginated(&self, page: PageRequest) -> Result<Paged<Tag>, AppError> {
        self.find_all_filtered(page, None).await
    }

    /// Case-insensitive name search, paginated by name. A blank search
    /// matches every tag.
    #[tracing::instrument(skip(self), fields(db.table = "tag", db.operation = "select", offset = page.offset(), limit = page.limit()))]
    pub async fn find_all_filtered(
        &self,
        page: PageRequest,
        name_contains: Option<&str>,
    ) -> Result<Paged<Tag>, AppError> {
        // NULL disables the filter.
        let pattern = name_contains
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let mut tx = transaction::begin_snapshot(&self.pool, "list tags").await?;
        let result = async {
            let total_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM tag WHERE ($1::text IS NULL OR name ILIKE $1)",
            )
            .bind(pattern.as_deref())
            .fetch_one(&mut *tx)
            .await?;

            let tags = sqlx::query_as::<Postgres, Tag>(&format!(
                "SELECT {} FROM tag WHERE ($1::text IS NULL OR name ILIKE $1) ORDER BY name, id LIMIT $2 OFFSET $3",
                TAG_COLUMNS
            ))
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;

            Ok::<_, AppError>(Paged::new(tags, total_count, page))
        }
        .await;
        transaction::finish(tx, result, "list tags").await
    }

    /// Overwrite name and scope. Existing links are kept as they are.
    #[tracing::instrument(skip(self, tag), fields(db.table = "tag", db.operation = "update", db.record_id = %tag.id))]
    pub async fn update(&self, tag: &Tag) -> Result<Tag, AppError> {
        tag.validate()?;
        let name = tag.name.trim();

        if let Some(existing) = self.find_by_name(name).await? {
            if existing.id != tag.id {
                return Err(AppError::Duplicate(format!("Tag '{}' already exists", name)));
            }
        }

        let updated = sqlx::query_as::<Postgres, Tag>(&format!(
            r#"
            UPDATE tag
            SET name = $2, applies_to = $3, updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            TAG_COLUMNS
        ))
        .bind(tag.id)
        .bind(name)
        .bind(tag.applies_to)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Tag {} not found", tag.id)))
    }

    /// Delete a tag and every link to it. Linked media are kept.
    #[tracing::instrument(skip(self), fields(db.table = "tag", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = transaction::begin(&self.pool, "delete tag").await?;
        let result = Self::delete_with_links(&mut tx, id).await;
        let links = transaction::finish(tx, result, "delete tag").await?;

        tracing::info!(tag_id = %id, links_removed = links, "Tag deleted");
        Ok(())
    }

    async fn delete_with_links(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<u64, AppError> {
        let links = association::unlink_all_for_tag(tx, id).await?;
        let result = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tag {} not found", id)));
        }
        Ok(links)
    }
}
