//! Media ↔ tag links
//!
//! Mutations take the caller's open transaction so a link is never committed
//! apart from the media change it belongs to. The `(media_id, tag_id)`
//! primary key is what keeps links unique; the existence check in [`link`]
//! only saves a write in the common case.

use std::collections::HashMap;

use mediashelf_core::models::Tag;
use mediashelf_core::AppError;
use sqlx::postgres::PgExecutor;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Link a medium to a tag. Returns `false` if the link already existed.
#[tracing::instrument(skip(tx), fields(db.table = "media_tag", db.operation = "insert"))]
pub async fn link(
    tx: &mut Transaction<'_, Postgres>,
    media_id: Uuid,
    tag_id: Uuid,
) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM media_tag WHERE media_id = $1 AND tag_id = $2)",
    )
    .bind(media_id)
    .bind(tag_id)
    .fetch_one(&mut **tx)
    .await?;

    if exists {
        tracing::debug!(%media_id, %tag_id, "Link already present");
        return Ok(false);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO media_tag (media_id, tag_id)
        VALUES ($1, $2)
        ON CONFLICT (media_id, tag_id) DO NOTHING
        "#,
    )
    .bind(media_id)
    .bind(tag_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        // Lost a race with a concurrent link of the same pair.
        tracing::debug!(%media_id, %tag_id, "Link inserted concurrently");
        return Ok(false);
    }

    Ok(true)
}

/// Remove a link. Returns `false` if there was nothing to remove.
#[tracing::instrument(skip(tx), fields(db.table = "media_tag", db.operation = "delete"))]
pub async fn unlink(
    tx: &mut Transaction<'_, Postgres>,
    media_id: Uuid,
    tag_id: Uuid,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM media_tag WHERE media_id = $1 AND tag_id = $2")
        .bind(media_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(%media_id, %tag_id, "Unlink of absent pair");
        return Ok(false);
    }

    Ok(true)
}

/// Remove every link of a medium. Returns the number of rows removed.
pub async fn unlink_all_for_media(
    tx: &mut Transaction<'_, Postgres>,
    media_id: Uuid,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM media_tag WHERE media_id = $1")
        .bind(media_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Remove every link to a tag. Returns the number of rows removed.
pub async fn unlink_all_for_tag(
    tx: &mut Transaction<'_, Postgres>,
    tag_id: Uuid,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM media_tag WHERE tag_id = $1")
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// Fail with `InvalidReference` naming every id in `tag_ids` that has no tag row.
pub async fn ensure_tags_exist(
    tx: &mut Transaction<'_, Postgres>,
    tag_ids: &[Uuid],
) -> Result<(), AppError> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM tag WHERE id = ANY($1)")
        .bind(tag_ids)
        .fetch_all(&mut **tx)
        .await?;

    let missing: Vec<String> = tag_ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(AppError::InvalidReference(format!(
            "Tag(s) not found: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Current tags of one medium, ordered by name.
pub async fn tags_for_media<'e, E>(executor: E, media_id: Uuid) -> Result<Vec<Tag>, AppError>
where
    E: PgExecutor<'e>,
{
    let tags = sqlx::query_as::<Postgres, Tag>(
        r#"
        SELECT t.id, t.name, t.applies_to, t.created_at, t.updated_at
        FROM tag t
        INNER JOIN media_tag mt ON mt.tag_id = t.id
        WHERE mt.media_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(media_id)
    .fetch_all(executor)
    .await?;
    Ok(tags)
}

#[derive(sqlx::FromRow)]
struct LinkedTag {
    media_id: Uuid,
    #[sqlx(flatten)]
    tag: Tag,
}

/// Tags for a batch of media in one query, keyed by media id.
///
/// Media without tags are absent from the map.
pub async fn tags_for_media_ids<'e, E>(
    executor: E,
    media_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Tag>>, AppError>
where
    E: PgExecutor<'e>,
{
    if media_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<Postgres, LinkedTag>(
        r#"
        SELECT mt.media_id, t.id, t.name, t.applies_to, t.created_at, t.updated_at
        FROM media_tag mt
        INNER JOIN tag t ON t.id = mt.tag_id
        WHERE mt.media_id = ANY($1)
        ORDER BY t.name
        "#,
    )
    .bind(media_ids)
    .fetch_all(executor)
    .await?;

    let mut map: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in rows {
        map.entry(row.media_id).or_default().push(row.tag);
    }
    Ok(map)
}

/// Number of link rows for a medium.
pub async fn count_for_media<'e, E>(executor: E, media_id: Uuid) -> Result<i64, AppError>
where
    E: PgExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_tag WHERE media_id = $1")
        .bind(media_id)
        .fetch_one(executor)
        .await?;
    Ok(count)
}
