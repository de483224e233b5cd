//! reviewer-core: pull request reviewer assignment
//!
//! Holds the domain model (teams, users, pull requests), the storage
//! capability traits the service depends on, an in-memory store, and the
//! [`AssignmentService`] that picks and rotates reviewers.

pub mod error;
pub mod models;
pub mod selection;
pub mod service;
pub mod store;

pub use error::{Error, Result, StoreError};
pub use models::{PullRequest, PullRequestStatus, Team, User};
pub use service::AssignmentService;
pub use store::{InMemoryStore, PullRequestStore, TeamStore, UserStore};
