//! reviewer-server: HTTP API and PostgreSQL storage
//!
//! Wires [`reviewer_core::AssignmentService`] to an axum router and to
//! sqlx-backed implementations of the core storage traits.

pub mod config;
pub mod db;
pub mod http;

pub use config::{ConfigError, HttpConfig, ReviewerConfig};
pub use http::{
    build_router, run_server, serve, ApiError, AppState, Backend, ServerConfig, ServerError,
};
