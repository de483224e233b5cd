//! PostgreSQL implementations of the core storage traits
//!
//! Each repository follows these patterns:
//! - Reviewer lists come back in one aggregate query (no N+1)
//! - Team creation relies on ON CONFLICT instead of a lock
//! - Transactions for multi-row writes

pub mod pull_requests;
pub mod teams;
pub mod users;

pub use pull_requests::PullRequestRepo;
pub use teams::TeamRepo;
pub use users::UserRepo;

use reviewer_core::StoreError;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} '{id}' already exists")]
    Conflict { resource: &'static str, id: String },

    #[error("pull request '{0}' is already merged")]
    Merged(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => StoreError::NotFound { resource, id },
            DbError::Conflict { resource, id } => StoreError::Conflict { resource, id },
            DbError::Merged(id) => StoreError::Merged(id),
            other => StoreError::backend(other),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
