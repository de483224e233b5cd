//! Assignment service
//!
//! Orchestrates team setup, user activation and the pull request lifecycle
//! on top of the storage traits. The service keeps no domain state of its
//! own; every read goes to storage, so concurrent requests only contend in
//! the storage layer.
//!
//! `create_team` is lookup-then-create and is not atomic here. Two
//! concurrent calls with the same name can both pass the lookup; storage
//! deduplicates the team row.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use crate::error::{Error, Result, StoreError};
use crate::models::{PullRequest, Team, User};
use crate::selection::{pick_one, pick_reviewers, MAX_REVIEWERS};
use crate::store::{PullRequestStore, TeamStore, UserStore};

pub struct AssignmentService {
    teams: Arc<dyn TeamStore>,
    users: Arc<dyn UserStore>,
    pull_requests: Arc<dyn PullRequestStore>,
    /// Only locked for the synchronous pick, never across an await
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl AssignmentService {
    /// Service with an entropy-seeded RNG.
    pub fn new(
        teams: Arc<dyn TeamStore>,
        users: Arc<dyn UserStore>,
        pull_requests: Arc<dyn PullRequestStore>,
    ) -> Self {
        Self::with_rng(teams, users, pull_requests, StdRng::from_entropy())
    }

    /// Service with a caller-supplied RNG (seed it for reproducible picks).
    pub fn with_rng<R>(
        teams: Arc<dyn TeamStore>,
        users: Arc<dyn UserStore>,
        pull_requests: Arc<dyn PullRequestStore>,
        rng: R,
    ) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Self {
            teams,
            users,
            pull_requests,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Service backed by one store that implements all three traits.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TeamStore + UserStore + PullRequestStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store)
    }

    pub fn from_store_with_rng<S, R>(store: Arc<S>, rng: R) -> Self
    where
        S: TeamStore + UserStore + PullRequestStore + 'static,
        R: RngCore + Send + 'static,
    {
        Self::with_rng(store.clone(), store.clone(), store, rng)
    }

    /// Create a team and upsert its members.
    ///
    /// Fails with [`Error::TeamExists`] if the name is taken. Returns the
    /// team as stored.
    pub async fn create_team(&self, name: &str, members: Vec<User>) -> Result<Team> {
        let team = Team::new(name, members)?;

        match self.teams.get_by_name(&team.name).await {
            Ok(_) => return Err(Error::TeamExists(team.name)),
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        self.teams.create(&team).await?;
        info!(team = %team.name, members = team.members.len(), "team created");

        Ok(self.teams.get_by_name(&team.name).await?)
    }

    pub async fn get_team(&self, name: &str) -> Result<Team> {
        Ok(self.teams.get_by_name(name).await?)
    }

    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        let mut user = self.users.get_by_id(user_id).await?;
        user.is_active = is_active;
        self.users.update(&user).await?;

        info!(user_id, is_active, "user activity changed");
        Ok(user)
    }

    /// Open a pull request and assign up to two active teammates of the
    /// author. An empty reviewer list is not an error.
    pub async fn create_pr(&self, pr_id: &str, name: &str, author_id: &str) -> Result<PullRequest> {
        match self.pull_requests.get_by_id(pr_id).await {
            Ok(_) => return Err(Error::PrExists(pr_id.to_owned())),
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let author = self.users.get_by_id(author_id).await?;
        let teammates = self.users.active_by_team(&author.team_name).await?;
        let pool: Vec<&User> = teammates
            .iter()
            .filter(|c| c.id != author.id && c.can_be_reviewer())
            .collect();

        let reviewers = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            pick_reviewers(&pool, MAX_REVIEWERS, &mut **rng)
        };
        debug!(pr_id, pool = pool.len(), ?reviewers, "reviewers selected");

        let pr = PullRequest::open(pr_id, name, author_id, reviewers);
        self.pull_requests.create(&pr).await.map_err(|e| match e {
            StoreError::Conflict { id, .. } => Error::PrExists(id),
            other => other.into(),
        })?;

        info!(pr_id, author_id, reviewers = pr.reviewer_ids.len(), "pull request created");
        Ok(pr)
    }

    /// Merge a pull request. Merging an already merged one returns it
    /// unchanged.
    pub async fn merge_pr(&self, pr_id: &str) -> Result<PullRequest> {
        let mut pr = self.pull_requests.get_by_id(pr_id).await?;
        if !pr.merge() {
            debug!(pr_id, "pull request already merged");
            return Ok(pr);
        }

        self.pull_requests.update(&pr).await?;
        info!(pr_id, "pull request merged");
        Ok(pr)
    }

    /// Swap `old_reviewer_id` for a random active teammate of theirs who is
    /// neither already on the pull request nor its author. The new reviewer
    /// takes the old reviewer's slot.
    ///
    /// Returns the updated pull request and the new reviewer's id.
    pub async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequest, String)> {
        let mut pr = self.pull_requests.get_by_id(pr_id).await?;

        if !pr.can_reassign() {
            return Err(Error::PrMerged(pr.id));
        }
        if !pr.has_reviewer(old_reviewer_id) {
            return Err(Error::NotAssigned {
                pr_id: pr.id,
                reviewer_id: old_reviewer_id.to_owned(),
            });
        }

        let old_reviewer = self.users.get_by_id(old_reviewer_id).await?;
        let teammates = self.users.active_by_team(&old_reviewer.team_name).await?;

        let assigned: HashSet<&str> = pr.reviewer_ids.iter().map(String::as_str).collect();
        let pool: Vec<&User> = teammates
            .iter()
            .filter(|c| {
                c.id != old_reviewer_id
                    && c.id != pr.author_id
                    && !assigned.contains(c.id.as_str())
                    && c.can_be_reviewer()
            })
            .collect();

        let new_reviewer_id = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            pick_one(&pool, &mut **rng).map(|u| u.id.clone())
        };
        let Some(new_reviewer_id) = new_reviewer_id else {
            return Err(Error::NoCandidate(pr.id));
        };

        pr.replace_reviewer(old_reviewer_id, new_reviewer_id.clone());
        self.pull_requests.update(&pr).await?;

        info!(
            pr_id,
            old = old_reviewer_id,
            new = %new_reviewer_id,
            "reviewer reassigned"
        );
        Ok((pr, new_reviewer_id))
    }

    /// Pull requests where the user is currently a reviewer.
    pub async fn get_user_reviews(&self, user_id: &str) -> Result<Vec<PullRequest>> {
        self.users.get_by_id(user_id).await?;
        Ok(self.pull_requests.by_reviewer(user_id).await?)
    }

    /// Current assignment count per reviewer.
    pub async fn get_statistics(&self) -> Result<BTreeMap<String, u64>> {
        Ok(self.pull_requests.statistics().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> AssignmentService {
        AssignmentService::from_store_with_rng(
            Arc::new(InMemoryStore::new()),
            StdRng::seed_from_u64(42),
        )
    }

    #[tokio::test]
    async fn create_team_twice_is_team_exists() {
        let svc = service();
        svc.create_team("backend", vec![User::new("u1", "Alice", "", true)])
            .await
            .unwrap();

        let err = svc.create_team("backend", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::TeamExists(name) if name == "backend"));
    }

    #[tokio::test]
    async fn create_team_rejects_blank_name() {
        let svc = service();
        let err = svc.create_team("", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::Invalid { .. }));
    }

    #[tokio::test]
    async fn lone_author_gets_no_reviewers() {
        let svc = service();
        svc.create_team("solo", vec![User::new("u1", "Alice", "", true)])
            .await
            .unwrap();

        let pr = svc.create_pr("pr-1", "Solo work", "u1").await.unwrap();
        assert!(pr.reviewer_ids.is_empty());
    }

    #[tokio::test]
    async fn unknown_author_is_not_found() {
        let svc = service();
        let err = svc.create_pr("pr-1", "Orphan", "ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { resource: "user", .. }));
    }
}
