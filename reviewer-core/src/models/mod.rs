//! Domain entities
//!
//! Plain owned values with a few predicates. No I/O happens here, so
//! everything is deterministic and safe to share read-only across tasks.

pub mod pull_request;
pub mod team;
pub mod user;

pub use pull_request::{PullRequest, PullRequestStatus};
pub use team::Team;
pub use user::User;
