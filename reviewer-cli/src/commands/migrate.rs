//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;
use reviewer_server::db::migrations;
use reviewer_server::ReviewerConfig;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Apply the schema and exit. Safe to run repeatedly.
pub async fn run_migrate(args: MigrateArgs, config: ReviewerConfig) -> Result<()> {
    let pool = super::connect(args.database_url, &config).await?;

    migrations::run(&pool)
        .await
        .context("Failed to apply database schema")?;

    tracing::info!("Database schema is up to date");
    Ok(())
}
