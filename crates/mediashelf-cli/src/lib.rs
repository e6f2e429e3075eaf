//! Shared plumbing for the operator binaries.

use anyhow::Context;
use mediashelf_core::{telemetry, Config, PageRequest};
use serde::Serialize;
use sqlx::PgPool;

/// Output format shared by the listing binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Load configuration, install tracing and open the pool.
pub async fn bootstrap() -> anyhow::Result<(Config, PgPool)> {
    let config = Config::from_env().context("Failed to load configuration")?;
    telemetry::init_tracing(config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
    let pool = mediashelf_db::connect(&config).await?;
    Ok((config, pool))
}

/// Build a page window bounded by the configured maximum.
pub fn page_request(config: &Config, offset: i64, limit: Option<i64>) -> anyhow::Result<PageRequest> {
    let limit = limit.unwrap_or(config.default_page_size);
    PageRequest::with_max(offset, limit, config.max_page_size).map_err(anyhow::Error::from)
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Truncate to `max_len` characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
