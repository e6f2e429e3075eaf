use chrono::Utc;
use mediashelf_core::models::{Media, MediaKind, MediaRow, MediaSource, NewMedia};
use mediashelf_core::{AppError, PageRequest, Paged};
use mediashelf_storage::{object_key, Storage};
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::association;
use super::query::{dedup, media_queries, MediaFilter};
use super::transaction;

const MEDIA_COLUMNS: &str =
    "id, kind, storage_key, external_url, title, description, created_at, updated_at";

/// Key of the stored object behind `row`, if its kind has one.
fn stored_key(row: &MediaRow) -> Option<&str> {
    if row.kind.is_storage_backed() {
        row.storage_key.as_deref()
    } else {
        None
    }
}

/// Raw bytes of an image or audio file to store before cataloguing it.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub data: Vec<u8>,
    /// File extension, with or without the leading dot.
    pub extension: String,
    pub content_type: String,
}

/// Media repository
///
/// Owns the media table and, through [`association`], the media side of the
/// tag links. Every medium it returns carries the tags linked at read time
/// and, for stored kinds, a display URL freshly resolved from its key.
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
    storage: Arc<dyn Storage>,
}

impl MediaRepository {
    pub fn new(pool: PgPool, storage: Arc<dyn Storage>) -> Self {
        Self { pool, storage }
    }

    fn display_url(&self, row: &MediaRow) -> Option<String> {
        stored_key(row).map(|key| self.storage.resolve(key))
    }

    async fn hydrate(&self, rows: Vec<MediaRow>) -> Result<Vec<Media>, AppError> {
        self.hydrate_with(&self.pool, rows).await
    }

    /// Attach tags and display URLs to a batch of rows, preserving order.
    async fn hydrate_with<'e, E>(&self, executor: E, rows: Vec<MediaRow>) -> Result<Vec<Media>, AppError>
    where
        E: PgExecutor<'e>,
    {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut tags = association::tags_for_media_ids(executor, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let row_tags = tags.remove(&row.id).unwrap_or_default();
                let url = self.display_url(&row);
                row.into_media(row_tags, url)
            })
            .collect())
    }

    async fn hydrate_one(&self, row: MediaRow) -> Result<Media, AppError> {
        let tags = association::tags_for_media(&self.pool, row.id).await?;
        let url = self.display_url(&row);
        Ok(row.into_media(tags, url))
    }

    /// Fetch a row and hold its lock until the transaction ends.
    async fn lock_row(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<MediaRow, AppError> {
        sqlx::query_as::<Postgres, MediaRow>(&format!(
            "SELECT {} FROM media WHERE id = $1 FOR UPDATE",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media {} not found", id)))
    }

    /// Remove a stored object on behalf of an open transaction.
    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.storage.delete(key).await.map_err(|e| {
            tracing::error!(error = %e, key = %key, "Storage delete failed; rolling back");
            AppError::from(e)
        })
    }

    async fn insert_with_links(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewMedia,
        tag_ids: &[Uuid],
    ) -> Result<MediaRow, AppError> {
        association::ensure_tags_exist(tx, tag_ids).await?;

        let now = Utc::now();
        let row: MediaRow = sqlx::query_as::<Postgres, MediaRow>(
            r#"
            INSERT INTO media (
                id, kind, storage_key, external_url, title, description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, kind, storage_key, external_url, title, description, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.source.kind())
        .bind(new.source.storage_key())
        .bind(new.source.external_url())
        .bind(new.title.trim())
        .bind(new.description.as_deref())
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        for tag_id in tag_ids {
            association::link(tx, row.id, *tag_id).await?;
        }

        Ok(row)
    }

    /// Insert a medium and link its tags in one transaction.
    ///
    /// An unknown tag id fails the whole call with `InvalidReference` and
    /// nothing is written.
    #[tracing::instrument(skip(self, new), fields(db.table = "media", db.operation = "insert", media_kind = %new.source.kind(), tag_count = new.tag_ids.len()))]
    pub async fn create(&self, new: NewMedia) -> Result<Media, AppError> {
        new.validate()?;
        let tag_ids = new.unique_tag_ids();

        let mut tx = transaction::begin(&self.pool, "create media").await?;
        let result = Self::insert_with_links(&mut tx, &new, &tag_ids).await;
        let row = transaction::finish(tx, result, "create media").await?;

        tracing::info!(media_id = %row.id, "Media created");
        self.hydrate_one(row).await
    }

    /// Store an uploaded file, then catalogue it.
    ///
    /// The kind is derived from the extension and content type. If the
    /// catalogue insert fails the uploaded object is removed again.
    #[tracing::instrument(skip(self, upload, title, description), fields(db.table = "media", db.operation = "insert", size_bytes = upload.data.len()))]
    pub async fn upload_and_create(
        &self,
        upload: MediaUpload,
        title: String,
        description: Option<String>,
        tag_ids: Vec<Uuid>,
    ) -> Result<Media, AppError> {
        let kind = MediaKind::classify_upload(&upload.extension, &upload.content_type);
        let key = object_key(kind, &upload.extension)?;

        let source = MediaSource::stored(kind, key.clone())
            .ok_or_else(|| AppError::Internal(format!("{} uploads cannot be stored", kind)))?;
        let mut new = NewMedia::new(source, title).with_tags(tag_ids);
        new.description = description;
        new.validate()?;

        self.storage
            .upload(&key, upload.data, &upload.content_type)
            .await?;

        match self.create(new).await {
            Ok(media) => Ok(media),
            Err(err) => {
                if let Err(cleanup_err) = self.storage.delete(&key).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        key = %key,
                        "Failed to remove uploaded object after create failure"
                    );
                }
                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Media>, AppError> {
        let row: Option<MediaRow> = sqlx::query_as::<Postgres, MediaRow>(&format!(
            "SELECT {} FROM media WHERE id = $1",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(self.hydrate_one(r).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    pub async fn find_all(&self) -> Result<Vec<Media>, AppError> {
        let mut queries = media_queries(&MediaFilter::default(), None);
        let rows: Vec<MediaRow> = queries
            .rows
            .build_query_as::<MediaRow>()
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    pub async fn find_all_paginated(&self, page: PageRequest) -> Result<Paged<Media>, AppError> {
        self.find_all_filtered(page, &MediaFilter::default()).await
    }

    /// One page of the filtered listing plus the size of the filtered set.
    #[tracing::instrument(skip(self, filter), fields(db.table = "media", db.operation = "select", offset = page.offset(), limit = page.limit(), tag_count = filter.tag_ids.len()))]
    pub async fn find_all_filtered(
        &self,
        page: PageRequest,
        filter: &MediaFilter,
    ) -> Result<Paged<Media>, AppError> {
        let mut queries = media_queries(filter, Some(page));
        let mut tx = transaction::begin_snapshot(&self.pool, "list media").await?;
        let result = async {
            let total_count: i64 = queries
                .count
                .build_query_scalar::<i64>()
                .fetch_one(&mut *tx)
                .await?;

            let rows: Vec<MediaRow> = queries
                .rows
                .build_query_as::<MediaRow>()
                .fetch_all(&mut *tx)
                .await?;

            let items = self.hydrate_with(&mut *tx, rows).await?;
            Ok::<_, AppError>((items, total_count))
        }
        .await;
        let (items, total_count) = transaction::finish(tx, result, "list media").await?;

        Ok(Paged::new(items, total_count, page))
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", tag_id = %tag_id))]
    pub async fn find_by_tag(&self, tag_id: Uuid) -> Result<Vec<Media>, AppError> {
        let mut queries = media_queries(&MediaFilter::new().tag(tag_id), None);
        let rows: Vec<MediaRow> = queries
            .rows
            .build_query_as::<MediaRow>()
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Overwrite title, description and locator of `media` (tags are untouched).
    ///
    /// The kind of a medium is fixed at creation. When a stored medium gets a
    /// new key, the object behind the old key is removed before the change
    /// commits; if storage refuses, nothing changes.
    #[tracing::instrument(skip(self, media), fields(db.table = "media", db.operation = "update", db.record_id = %media.id))]
    pub async fn update(&self, media: &Media) -> Result<Media, AppError> {
        media.validate()?;

        let mut tx = transaction::begin(&self.pool, "update media").await?;
        let result = self.update_locked(&mut tx, media).await;
        let row = transaction::finish(tx, result, "update media").await?;

        self.hydrate_one(row).await
    }

    async fn update_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        media: &Media,
    ) -> Result<MediaRow, AppError> {
        let current = Self::lock_row(tx, media.id).await?;
        if current.kind != media.kind {
            return Err(AppError::InvalidInput(format!(
                "Media {} is {} and cannot become {}",
                media.id, current.kind, media.kind
            )));
        }

        let row = sqlx::query_as::<Postgres, MediaRow>(&format!(
            r#"
            UPDATE media
            SET storage_key = $2, external_url = $3, title = $4, description = $5, updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        ))
        .bind(media.id)
        .bind(media.storage_key.as_deref())
        .bind(media.external_url.as_deref())
        .bind(media.title.trim())
        .bind(media.description.as_deref())
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        if let Some(old_key) = stored_key(&current) {
            if row.storage_key.as_deref() != Some(old_key) {
                self.delete_object(old_key).await?;
                tracing::info!(media_id = %row.id, old_key = %old_key, "Replaced stored object");
            }
        }

        Ok(row)
    }

    /// Delete a medium, its links and its stored object as one unit.
    ///
    /// The row is locked and removed first; the object is deleted last and
    /// the transaction commits only if that succeeds. A storage failure rolls
    /// everything back and yields `StorageUnavailable`.
    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = transaction::begin(&self.pool, "delete media").await?;
        let result = self.delete_locked(&mut tx, id).await;
        let links = transaction::finish(tx, result, "delete media").await?;

        tracing::info!(media_id = %id, links_removed = links, "Media deleted");
        Ok(())
    }

    async fn delete_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<u64, AppError> {
        let row = Self::lock_row(tx, id).await?;

        let links = association::unlink_all_for_media(tx, id).await?;
        sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        if let Some(key) = stored_key(&row) {
            self.delete_object(key).await?;
        }
        Ok(links)
    }

    /// Link an existing tag to an existing medium. Linking twice is a no-op.
    #[tracing::instrument(skip(self), fields(db.table = "media_tag", db.operation = "insert", db.record_id = %media_id, tag_id = %tag_id))]
    pub async fn associate_tag(&self, media_id: Uuid, tag_id: Uuid) -> Result<(), AppError> {
        let mut tx = transaction::begin(&self.pool, "associate tag").await?;
        let result = Self::link_checked(&mut tx, media_id, tag_id).await;
        transaction::finish(tx, result, "associate tag").await?;
        Ok(())
    }

    async fn link_checked(
        tx: &mut Transaction<'_, Postgres>,
        media_id: Uuid,
        tag_id: Uuid,
    ) -> Result<bool, AppError> {
        let media_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM media WHERE id = $1)")
                .bind(media_id)
                .fetch_one(&mut **tx)
                .await?;
        if !media_exists {
            return Err(AppError::NotFound(format!("Media {} not found", media_id)));
        }

        association::ensure_tags_exist(tx, &[tag_id]).await?;
        association::link(tx, media_id, tag_id).await
    }

    /// Unlink a tag from a medium. Removing an absent link succeeds.
    #[tracing::instrument(skip(self), fields(db.table = "media_tag", db.operation = "delete", db.record_id = %media_id, tag_id = %tag_id))]
    pub async fn remove_tag(&self, media_id: Uuid, tag_id: Uuid) -> Result<(), AppError> {
        let mut tx = transaction::begin(&self.pool, "remove tag").await?;
        let result = association::unlink(&mut tx, media_id, tag_id).await;
        transaction::finish(tx, result, "remove tag").await?;
        Ok(())
    }

    /// Replace the tag set of a medium with `tag_ids`.
    #[tracing::instrument(skip(self, tag_ids), fields(db.table = "media_tag", db.operation = "update", db.record_id = %media_id))]
    pub async fn set_tags(&self, media_id: Uuid, tag_ids: &[Uuid]) -> Result<Media, AppError> {
        let tag_ids = dedup(tag_ids);

        let mut tx = transaction::begin(&self.pool, "set tags").await?;
        let result = Self::replace_links(&mut tx, media_id, &tag_ids).await;
        transaction::finish(tx, result, "set tags").await?;

        self.find_by_id(media_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", media_id)))
    }

    async fn replace_links(
        tx: &mut Transaction<'_, Postgres>,
        media_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let media_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM media WHERE id = $1)")
                .bind(media_id)
                .fetch_one(&mut **tx)
                .await?;
        if !media_exists {
            return Err(AppError::NotFound(format!("Media {} not found", media_id)));
        }

        association::ensure_tags_exist(tx, tag_ids).await?;

        sqlx::query("DELETE FROM media_tag WHERE media_id = $1 AND NOT (tag_id = ANY($2))")
            .bind(media_id)
            .bind(tag_ids)
            .execute(&mut **tx)
            .await?;

        for tag_id in tag_ids {
            association::link(tx, media_id, *tag_id).await?;
        }
        Ok(())
    }
}
