use chrono::{DateTime, TimeZone, Utc};
use mediashelf_core::models::{Media, MediaSource, NewMedia, NewTag, Tag, TagScope};
use uuid::Uuid;

use super::TestDb;

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn image_source(name: &str) -> MediaSource {
    MediaSource::Image {
        storage_key: format!("images/{}.png", name),
    }
}

pub fn video_source() -> MediaSource {
    MediaSource::Video {
        external_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
    }
}

pub async fn create_tag(db: &TestDb, name: &str) -> Tag {
    db.tags
        .create(NewTag::new(name))
        .await
        .expect("Failed to create tag")
}

pub async fn create_scoped_tag(db: &TestDb, name: &str, scope: TagScope) -> Tag {
    db.tags
        .create(NewTag::new(name).with_scope(scope))
        .await
        .expect("Failed to create tag")
}

pub async fn create_image(db: &TestDb, title: &str, tag_ids: &[Uuid]) -> Media {
    db.media
        .create(NewMedia::new(image_source(title), title).with_tags(tag_ids.iter().copied()))
        .await
        .expect("Failed to create image")
}

pub async fn create_video(db: &TestDb, title: &str, tag_ids: &[Uuid]) -> Media {
    db.media
        .create(NewMedia::new(video_source(), title).with_tags(tag_ids.iter().copied()))
        .await
        .expect("Failed to create video")
}

pub fn sorted_ids(tags: &[Tag]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
    ids.sort();
    ids
}
