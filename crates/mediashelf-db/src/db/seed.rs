//! Built-in tags present in every catalog.

use mediashelf_core::constants::{BUILTIN_IMAGE_TAG_ID, BUILTIN_VIDEO_TAG_ID};
use mediashelf_core::models::TagScope;
use mediashelf_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

const BUILTIN_TAGS: [(Uuid, &str, TagScope); 2] = [
    (BUILTIN_IMAGE_TAG_ID, "image", TagScope::Image),
    (BUILTIN_VIDEO_TAG_ID, "video", TagScope::Video),
];

/// Insert the built-in tags, or reset their scope if they already exist.
///
/// A built-in whose name is already taken by a user tag is skipped with a
/// warning; the user's tag is left alone. Safe to run on every start.
#[tracing::instrument(skip(pool), fields(db.table = "tag", db.operation = "upsert"))]
pub async fn seed_initial_tags(pool: &PgPool) -> Result<(), AppError> {
    let mut seeded = 0;

    for (id, name, scope) in BUILTIN_TAGS {
        let row: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO tag (id, name, applies_to, created_at, updated_at)
            SELECT $1::uuid, $2::text, $3::tag_scope, NOW(), NOW()
            WHERE NOT EXISTS (SELECT 1 FROM tag WHERE name = $2::text AND id <> $1::uuid)
            ON CONFLICT (id) DO UPDATE SET applies_to = EXCLUDED.applies_to, updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(scope)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, tag = name, "Failed to seed tag");
            AppError::from(e)
        })?;

        match row {
            Some(_) => seeded += 1,
            None => tracing::warn!(
                tag = name,
                builtin_id = %id,
                "Tag name already used by another tag; built-in not seeded"
            ),
        }
    }

    tracing::info!(seeded, total = BUILTIN_TAGS.len(), "Built-in tags seeded");
    Ok(())
}
