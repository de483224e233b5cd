//! Tracing setup for the pr-reviewer binary
//!
//! Filter precedence:
//!   RUST_LOG=reviewer_core=debug pr-reviewer serve   # explicit filter wins
//!   pr-reviewer --debug serve                         # debug everywhere
//!   LOG_LEVEL=WARN pr-reviewer serve                  # configured level
//!
//! An unknown `log_level` is rejected even when RUST_LOG is set, so a bad
//! config never goes unnoticed.

use anyhow::{anyhow, bail, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Force debug logging unless RUST_LOG is set
    pub debug: bool,
    /// Level from config or LOG_LEVEL
    pub log_level: String,
}

/// Map a configured level name to an EnvFilter directive.
pub fn level_directive(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        _ => bail!("unknown log level '{level}' (expected DEBUG, INFO, WARN or ERROR)"),
    }
}

fn build_filter(config: &TracingConfig) -> Result<EnvFilter> {
    let configured = level_directive(&config.log_level)?;

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = if config.debug { "debug" } else { configured };
    Ok(EnvFilter::new(directive))
}

/// Initialize console tracing.
pub fn init(config: &TracingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
