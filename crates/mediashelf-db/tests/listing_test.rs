#[path = "helpers/mod.rs"]
mod helpers;

use std::collections::HashSet;

use helpers::fixtures::{create_image, create_tag, create_video};
use helpers::{setup_test_db, TestDb};
use mediashelf_core::{PageRequest, Paged};
use mediashelf_core::models::Media;
use mediashelf_db::transaction;
use mediashelf_db::MediaFilter;
use uuid::Uuid;

/// Walk every page of a filtered listing.
async fn collect_pages(db: &TestDb, filter: &MediaFilter, limit: i64) -> (Vec<Paged<Media>>, Vec<Uuid>) {
    let mut pages = Vec::new();
    let mut ids = Vec::new();
    let mut page = PageRequest::new(0, limit).unwrap();
    loop {
        let result = db.media.find_all_filtered(page, filter).await.unwrap();
        ids.extend(result.items.iter().map(|m| m.id));
        let more = result.has_more();
        pages.push(result);
        if !more {
            break;
        }
        page = page.next();
    }
    (pages, ids)
}

#[tokio::test]
async fn test_pages_partition_the_filtered_set() {
    let db = setup_test_db().await;
    let tag = create_tag(&db, "series").await;
    for i in 0..7 {
        create_image(&db, &format!("Frame {}", i), &[tag.id]).await;
    }
    create_video(&db, "Unrelated", &[]).await;

    let filter = MediaFilter::new().tag(tag.id);
    let (pages, ids) = collect_pages(&db, &filter, 3).await;

    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|p| p.total_count == 7));
    assert_eq!(pages[2].items.len(), 1);
    assert!(!pages[2].has_more());

    // No gaps, no overlaps.
    let unique: HashSet<Uuid> = ids.iter().copied().collect();
    assert_eq!(ids.len(), 7);
    assert_eq!(unique.len(), 7);

    let full = db.media.find_by_tag(tag.id).await.unwrap();
    let expected: Vec<Uuid> = full.iter().map(|m| m.id).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_listing_is_newest_first() {
    let db = setup_test_db().await;
    let first = create_image(&db, "First", &[]).await;
    let second = create_image(&db, "Second", &[]).await;
    let third = create_video(&db, "Third", &[]).await;

    let page = db
        .media
        .find_all_paginated(PageRequest::default())
        .await
        .unwrap();

    let ids: Vec<Uuid> = page.items.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
    assert_eq!(page.total_count, 3);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_tag_filter_is_any_of_and_never_duplicates() {
    let db = setup_test_db().await;
    let a = create_tag(&db, "a").await;
    let b = create_tag(&db, "b").await;
    let other = create_tag(&db, "other").await;

    let both = create_image(&db, "Both", &[a.id, b.id]).await;
    let only_a = create_image(&db, "Only A", &[a.id]).await;
    let only_b = create_video(&db, "Only B", &[b.id]).await;
    create_image(&db, "Neither", &[other.id]).await;

    let result = db
        .media
        .find_all_filtered(PageRequest::default(), &MediaFilter::new().tags([a.id, b.id]))
        .await
        .unwrap();

    assert_eq!(result.total_count, 3);
    let ids: HashSet<Uuid> = result.items.iter().map(|m| m.id).collect();
    assert_eq!(result.items.len(), 3);
    assert_eq!(ids, HashSet::from([both.id, only_a.id, only_b.id]));

    // Tags on the returned media are complete, not just the matching ones.
    let both_row = result.items.iter().find(|m| m.id == both.id).unwrap();
    assert_eq!(both_row.tags.len(), 2);
}

#[tokio::test]
async fn test_title_filter_is_case_insensitive_substring() {
    let db = setup_test_db().await;
    create_image(&db, "Sunset over Harbour", &[]).await;
    create_image(&db, "SUNSET again", &[]).await;
    create_image(&db, "Morning", &[]).await;
    create_image(&db, "100% real", &[]).await;

    let result = db
        .media
        .find_all_filtered(PageRequest::default(), &MediaFilter::new().title("  sunset "))
        .await
        .unwrap();
    assert_eq!(result.total_count, 2);

    // Wildcards in the search text are literal.
    let percent = db
        .media
        .find_all_filtered(PageRequest::default(), &MediaFilter::new().title("%"))
        .await
        .unwrap();
    assert_eq!(percent.total_count, 1);
}

#[tokio::test]
async fn test_empty_filters_mean_no_filter() {
    let db = setup_test_db().await;
    create_image(&db, "One", &[]).await;
    create_video(&db, "Two", &[]).await;

    let filter = MediaFilter::new().title("   ").tags(Vec::new());
    let result = db
        .media
        .find_all_filtered(PageRequest::default(), &filter)
        .await
        .unwrap();
    assert_eq!(result.total_count, 2);
    assert_eq!(result.items.len(), 2);
}

#[tokio::test]
async fn test_combined_filters_count_matches_rows() {
    let db = setup_test_db().await;
    let tag = create_tag(&db, "travel").await;
    create_image(&db, "Travel Lisbon", &[tag.id]).await;
    create_image(&db, "Travel Porto", &[tag.id]).await;
    create_image(&db, "Travel Faro", &[]).await;
    create_image(&db, "Home", &[tag.id]).await;

    let filter = MediaFilter::new().title("travel").tag(tag.id);
    let (pages, ids) = collect_pages(&db, &filter, 1).await;

    assert_eq!(pages[0].total_count, 2);
    assert_eq!(ids.len(), 2);
}

#[tokio::test]
async fn test_offset_past_end_returns_empty_page() {
    let db = setup_test_db().await;
    create_image(&db, "Only", &[]).await;

    let page = db
        .media
        .find_all_paginated(PageRequest::new(10, 5).unwrap())
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 1);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_snapshot_does_not_see_later_inserts() {
    let db = setup_test_db().await;
    create_image(&db, "Before", &[]).await;

    let mut tx = transaction::begin_snapshot(db.pool(), "count media").await.unwrap();
    let count_media = "SELECT COUNT(*) FROM media";
    let before: i64 = sqlx::query_scalar(count_media).fetch_one(&mut *tx).await.unwrap();

    create_image(&db, "After", &[]).await;

    let during: i64 = sqlx::query_scalar(count_media).fetch_one(&mut *tx).await.unwrap();
    let isolation: String = sqlx::query_scalar("SHOW transaction_isolation")
        .fetch_one(&mut *tx)
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(before, 1);
    assert_eq!(during, 1);
    assert_eq!(isolation, "repeatable read");
    assert_eq!(db.media_rows().await, 2);
}
