//! pr-reviewer - pull request reviewer assignment service
//!
//! - `serve`: run the HTTP API (PostgreSQL or in-memory storage)
//! - `migrate`: create or update the PostgreSQL schema
//!
//! Settings come from `config.yaml` (optional), then environment variables
//! (`.env` is read first), then command line flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reviewer_server::config::DEFAULT_CONFIG_PATH;
use reviewer_server::ReviewerConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "pr-reviewer",
    author,
    version,
    about = "Assigns pull request reviewers from the author's team"
)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, short = 'c', global = true, env = "PR_REVIEWER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable debug logging (RUST_LOG still wins)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply the database schema and exit
    Migrate(commands::migrate::MigrateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = ReviewerConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        log_level: config.log_level.clone(),
    })?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await?,
        Commands::Migrate(args) => commands::run_migrate(args, config).await?,
    }

    Ok(())
}
