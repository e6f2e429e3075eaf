#[path = "helpers/mod.rs"]
mod helpers;

use chrono::NaiveDate;
use helpers::fixtures::at;
use helpers::setup_test_db;
use mediashelf_core::models::NewTodo;
use mediashelf_core::{AppError, PageRequest, Window};
use uuid::Uuid;

fn window(from: (i32, u32, u32), to: (i32, u32, u32)) -> Window {
    Window::new(at(from.0, from.1, from.2), at(to.0, to.1, to.2)).unwrap()
}

#[tokio::test]
async fn test_due_date_window_membership() {
    let db = setup_test_db().await;
    let todo = db
        .todos
        .create(NewTodo::new("File taxes").with_due_date(at(2024, 1, 15)))
        .await
        .unwrap();

    let hit = db
        .todos
        .find_by_date_range(&window((2024, 1, 10), (2024, 1, 20)))
        .await
        .unwrap();
    assert_eq!(hit.iter().map(|t| t.id).collect::<Vec<_>>(), vec![todo.id]);

    let miss = db
        .todos
        .find_by_date_range(&window((2024, 1, 16), (2024, 1, 20)))
        .await
        .unwrap();
    assert!(miss.is_empty());
}

#[tokio::test]
async fn test_period_overlap_is_boundary_inclusive() {
    let db = setup_test_db().await;
    let todo = db
        .todos
        .create(NewTodo::new("January sprint").with_period(at(2024, 1, 1), at(2024, 1, 31)))
        .await
        .unwrap();

    let touching = db
        .todos
        .find_by_date_range(&window((2024, 1, 31), (2024, 2, 5)))
        .await
        .unwrap();
    assert_eq!(touching.len(), 1);
    assert_eq!(touching[0].id, todo.id);

    let after = db
        .todos
        .find_by_date_range(&window((2024, 2, 1), (2024, 2, 5)))
        .await
        .unwrap();
    assert!(after.is_empty());
}

#[tokio::test]
async fn test_completed_todos_are_excluded_everywhere() {
    let db = setup_test_db().await;
    let dated = db
        .todos
        .create(NewTodo::new("Done dated").with_due_date(at(2024, 1, 15)))
        .await
        .unwrap();
    let undated = db.todos.create(NewTodo::new("Done undated")).await.unwrap();

    db.todos.set_completed(dated.id, true).await.unwrap();
    db.todos.set_completed(undated.id, true).await.unwrap();

    let in_window = db
        .todos
        .find_by_date_range(&window((2024, 1, 1), (2024, 12, 31)))
        .await
        .unwrap();
    assert!(in_window.is_empty());

    let without = db
        .todos
        .find_without_due_date(PageRequest::default())
        .await
        .unwrap();
    assert!(without.items.is_empty());
    assert_eq!(without.total_count, 0);
}

#[tokio::test]
async fn test_window_results_ordered_by_earliest_date() {
    let db = setup_test_db().await;
    let late_due = db
        .todos
        .create(NewTodo::new("Late").with_due_date(at(2024, 3, 20)))
        .await
        .unwrap();
    let early_period = db
        .todos
        .create(NewTodo::new("Early").with_period(at(2024, 3, 2), at(2024, 3, 25)))
        .await
        .unwrap();
    let mixed = db
        .todos
        .create(
            NewTodo::new("Mixed")
                .with_period(at(2024, 3, 10), at(2024, 3, 12))
                .with_due_date(at(2024, 3, 5)),
        )
        .await
        .unwrap();

    let todos = db
        .todos
        .find_by_date_range(&window((2024, 3, 1), (2024, 3, 31)))
        .await
        .unwrap();
    let ids: Vec<Uuid> = todos.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![early_period.id, mixed.id, late_due.id]);
}

#[tokio::test]
async fn test_find_by_date_covers_the_whole_day() {
    let db = setup_test_db().await;
    let evening = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2024, 1, 15, 23, 30, 0).unwrap();
    let todo = db
        .todos
        .create(NewTodo::new("Late call").with_due_date(evening))
        .await
        .unwrap();

    let day = db
        .todos
        .find_by_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        .await
        .unwrap();
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].id, todo.id);

    let next = db
        .todos
        .find_by_date(NaiveDate::from_ymd_opt(2024, 1, 16).unwrap())
        .await
        .unwrap();
    assert!(next.is_empty());
}

#[tokio::test]
async fn test_without_due_date_is_paginated_newest_first() {
    let db = setup_test_db().await;
    let mut created = Vec::new();
    for i in 0..5 {
        created.push(
            db.todos
                .create(NewTodo::new(format!("Someday {}", i)))
                .await
                .unwrap(),
        );
    }
    db.todos
        .create(NewTodo::new("Scheduled").with_due_date(at(2024, 5, 1)))
        .await
        .unwrap();
    db.todos
        .create(NewTodo::new("Period").with_period(at(2024, 5, 1), at(2024, 5, 2)))
        .await
        .unwrap();

    let first = db
        .todos
        .find_without_due_date(PageRequest::new(0, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(first.total_count, 5);
    assert_eq!(first.items.len(), 2);
    assert!(first.has_more());
    assert_eq!(first.items[0].id, created[4].id);

    let last = db
        .todos
        .find_without_due_date(PageRequest::new(4, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert!(!last.has_more());
    assert_eq!(last.items[0].id, created[0].id);
}

#[tokio::test]
async fn test_half_period_is_rejected() {
    let db = setup_test_db().await;
    let result = db
        .todos
        .create(NewTodo {
            start_date: Some(at(2024, 1, 1)),
            ..NewTodo::new("Half")
        })
        .await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(db.todos.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_and_delete() {
    let db = setup_test_db().await;
    let mut todo = db.todos.create(NewTodo::new("Draft")).await.unwrap();
    assert!(!todo.has_due_date());

    todo.title = "Final".to_string();
    todo.due_date = Some(at(2024, 6, 1));
    let updated = db.todos.update(&todo).await.unwrap();
    assert_eq!(updated.title, "Final");
    assert!(updated.has_due_date());
    assert!(updated.is_overdue_at(at(2024, 6, 2)));

    db.todos.delete(todo.id).await.unwrap();
    assert!(db.todos.find_by_id(todo.id).await.unwrap().is_none());
    assert!(matches!(
        db.todos.delete(todo.id).await,
        Err(AppError::NotFound(_))
    ));

    let mut ghost = updated.clone();
    ghost.id = Uuid::new_v4();
    assert!(matches!(
        db.todos.update(&ghost).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_find_all_filtered_by_completion() {
    let db = setup_test_db().await;
    let done = db.todos.create(NewTodo::new("Done")).await.unwrap();
    db.todos.create(NewTodo::new("Open")).await.unwrap();
    db.todos.set_completed(done.id, true).await.unwrap();

    let completed = db
        .todos
        .find_all_filtered(PageRequest::default(), Some(true))
        .await
        .unwrap();
    assert_eq!(completed.total_count, 1);
    assert_eq!(completed.items[0].id, done.id);

    let all = db
        .todos
        .find_all_paginated(PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.total_count, 2);
}
