//! Storage capability traits
//!
//! The service only needs lookup by key, listing by team or reviewer, and
//! update. Any backend that implements these is substitutable. Writes that
//! touch more than one row (team + members, pull request + reviewer links)
//! must be applied atomically by the implementation.

mod memory;

pub use memory::InMemoryStore;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{PullRequest, Team, User};

#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Persist the team and upsert its members.
    ///
    /// Creating a team whose name already exists must not produce a second
    /// team row; members are still upserted.
    async fn create(&self, team: &Team) -> Result<(), StoreError>;

    /// Team with its current members.
    async fn get_by_name(&self, name: &str) -> Result<Team, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<User, StoreError>;

    async fn update(&self, user: &User) -> Result<(), StoreError>;

    /// Active members of a team.
    async fn active_by_team(&self, team_name: &str) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait PullRequestStore: Send + Sync {
    /// Insert the pull request with its reviewer list.
    ///
    /// Returns [`StoreError::Conflict`] when the id is taken.
    async fn create(&self, pr: &PullRequest) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<PullRequest, StoreError>;

    /// Replace status, name and reviewer list in one atomic write.
    ///
    /// Returns [`StoreError::Merged`] instead of writing an OPEN snapshot
    /// over a pull request that is already merged.
    async fn update(&self, pr: &PullRequest) -> Result<(), StoreError>;

    /// Pull requests the user currently reviews.
    async fn by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>, StoreError>;

    /// Current reviewer assignment count per user.
    async fn statistics(&self) -> Result<BTreeMap<String, u64>, StoreError>;
}
