//! Error taxonomy for reviewer assignment.
//!
//! [`Error`] is what the service returns to callers. Every variant except
//! `Storage` is a recoverable, caller-visible condition. [`StoreError`] is
//! what storage adapters return; the service lifts `NotFound` and passes
//! everything else through untouched.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by storage adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Unique key already taken
    #[error("conflict: {resource} '{id}' already exists")]
    Conflict { resource: &'static str, id: String },

    /// Write would move a merged pull request back to OPEN
    #[error("pull request '{0}' is already merged")]
    Merged(String),

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// Errors returned by [`crate::AssignmentService`]
#[derive(Debug, Error)]
pub enum Error {
    #[error("team '{0}' already exists")]
    TeamExists(String),

    #[error("pull request '{0}' already exists")]
    PrExists(String),

    #[error("pull request '{0}' is merged and cannot be modified")]
    PrMerged(String),

    #[error("user '{reviewer_id}' is not assigned to pull request '{pr_id}'")]
    NotAssigned { pr_id: String, reviewer_id: String },

    #[error("no active replacement candidate for pull request '{0}'")]
    NoCandidate(String),

    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { resource, id } => Self::NotFound { resource, id },
            StoreError::Merged(id) => Self::PrMerged(id),
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_lifts_to_not_found() {
        let err: Error = StoreError::not_found("user", "u1").into();
        assert!(matches!(err, Error::NotFound { resource: "user", ref id } if id == "u1"));
        assert_eq!(err.to_string(), "user 'u1' not found");
    }

    #[test]
    fn backend_errors_stay_opaque() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err: Error = StoreError::backend(io).into();
        assert!(matches!(err, Error::Storage(StoreError::Backend(_))));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn merged_write_lifts_to_pr_merged() {
        let err: Error = StoreError::Merged("pr-1".into()).into();
        assert!(matches!(err, Error::PrMerged(ref id) if id == "pr-1"));
    }
}
