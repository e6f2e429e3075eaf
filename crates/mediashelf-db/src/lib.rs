//! Mediashelf Database Library
//!
//! PostgreSQL persistence for media, tags and todos.

pub mod db;

pub use db::*;

use std::time::Duration;

use anyhow::Context;
use mediashelf_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Open a connection pool sized and timed from `config`.
pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}
