//! Command implementations for the pr-reviewer CLI

pub mod migrate;
pub mod serve;

pub use migrate::run_migrate;
pub use serve::run_serve;

use anyhow::{Context, Result};
use reviewer_server::db::create_pool_with_options;
use reviewer_server::ReviewerConfig;
use reviewer_server::db::PgPool;

/// Connect using the flag value if given, else the configured URL.
async fn connect(database_url: Option<String>, config: &ReviewerConfig) -> Result<PgPool> {
    let url = database_url.unwrap_or_else(|| config.database_url.clone());

    create_pool_with_options(&url, config.max_connections)
        .await
        .context("Failed to create database pool")
}
