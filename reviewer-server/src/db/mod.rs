//! Database layer - connection pool, schema and repositories
//!
//! - Connection pool with an explicit limit
//! - Reviewer lists fetched with `array_agg`, no N+1 queries
//! - Every multi-row write runs in one transaction; a dropped future rolls
//!   it back

pub mod migrations;
pub mod pool;
pub mod repos;

use std::sync::Arc;

use reviewer_core::AssignmentService;

pub use sqlx::PgPool;

pub use pool::{create_pool, create_pool_with_options, ping};
pub use repos::{DbError, PullRequestRepo, TeamRepo, UserRepo};

/// Assignment service backed by PostgreSQL repositories sharing one pool.
pub fn assignment_service(pool: &PgPool) -> AssignmentService {
    AssignmentService::new(
        Arc::new(TeamRepo::new(pool.clone())),
        Arc::new(UserRepo::new(pool.clone())),
        Arc::new(PullRequestRepo::new(pool.clone())),
    )
}
