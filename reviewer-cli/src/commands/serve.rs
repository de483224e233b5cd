//! HTTP server command
//!
//! Picks the storage backend, then runs the API until shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use reviewer_core::{AssignmentService, InMemoryStore};
use reviewer_server::db::{self, migrations};
use reviewer_server::config::check_address;
use reviewer_server::{run_server, AppState, Backend, ReviewerConfig, ServerConfig};

/// Where teams, users and pull requests are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Storage {
    /// PostgreSQL (schema is applied on startup)
    Postgres,
    /// Process memory, lost on exit
    Memory,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// host:port to bind to (overrides config and PR_REVIEWER_ADDRESS)
    #[arg(long, short = 'b', value_parser = parse_bind)]
    pub bind: Option<String>,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Storage backend
    #[arg(long, value_enum, default_value_t = Storage::Postgres)]
    pub storage: Storage,
}

fn parse_bind(value: &str) -> Result<String, String> {
    check_address(value)?;
    Ok(value.to_string())
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: ReviewerConfig) -> Result<()> {
    let mut server_config = ServerConfig::from(config.http.clone());
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }

    let (service, backend) = match args.storage {
        Storage::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on exit");
            let store = Arc::new(InMemoryStore::new());
            (AssignmentService::from_store(store), Backend::Memory)
        }
        Storage::Postgres => {
            let pool = super::connect(args.database_url, &config).await?;
            migrations::run(&pool)
                .await
                .context("Failed to apply database schema")?;
            (db::assignment_service(&pool), Backend::Postgres(pool))
        }
    };

    tracing::info!(
        bind = %server_config.bind_addr,
        storage = ?args.storage,
        timeout = ?server_config.request_timeout,
        "Starting pr-reviewer"
    );

    // Run server (blocks until shutdown)
    run_server(AppState::new(service, backend), server_config)
        .await
        .context("Server error")?;

    Ok(())
}
