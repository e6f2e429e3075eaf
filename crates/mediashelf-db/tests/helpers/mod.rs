#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use mediashelf_db::{MediaRepository, TagRepository, TodoRepository};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;

use storage::MemoryStorage;

/// Test database with migrated schema and repositories wired to a
/// recording in-memory storage.
pub struct TestDb {
    pub pool: PgPool,
    pub storage: Arc<MemoryStorage>,
    pub media: MediaRepository,
    pub tags: TagRepository,
    pub todos: TodoRepository,
    _container: ContainerAsync<Postgres>,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Number of link rows for a (media, tag) pair.
    pub async fn link_rows(&self, media_id: uuid::Uuid, tag_id: uuid::Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM media_tag WHERE media_id = $1 AND tag_id = $2")
            .bind(media_id)
            .bind(tag_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count links")
    }

    /// Make every `DELETE FROM media` fail inside the database.
    pub async fn refuse_media_deletes(&self) {
        sqlx::query(
            r#"
            CREATE FUNCTION refuse_media_delete() RETURNS trigger LANGUAGE plpgsql AS $$
            BEGIN
                RAISE EXCEPTION 'media rows are read-only in this test';
            END
            $$
            "#,
        )
        .execute(&self.pool)
        .await
        .expect("Failed to create trigger function");

        sqlx::query(
            "CREATE TRIGGER media_no_delete BEFORE DELETE ON media FOR EACH ROW EXECUTE FUNCTION refuse_media_delete()",
        )
        .execute(&self.pool)
        .await
        .expect("Failed to create trigger");
    }

    pub async fn media_rows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count media")
    }
}

/// Start PostgreSQL in a container and apply migrations.
pub async fn setup_test_db() -> TestDb {
    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    let connection_string = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&connection_string)
        .await
        .expect("Failed to connect to test database");

    mediashelf_db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let storage = Arc::new(MemoryStorage::new("https://cdn.test"));

    TestDb {
        media: MediaRepository::new(pool.clone(), storage.clone()),
        tags: TagRepository::new(pool.clone()),
        todos: TodoRepository::new(pool.clone()),
        pool,
        storage,
        _container: container,
    }
}
