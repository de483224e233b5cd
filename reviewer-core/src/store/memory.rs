//! In-memory implementation of the storage traits.
//!
//! All state lives behind a single `RwLock`, so every write (team + members,
//! pull request + reviewers) is applied as one unit. State is lost on
//! restart. Used by tests and by `serve --storage memory`.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PullRequestStore, TeamStore, UserStore};
use crate::error::StoreError;
use crate::models::{PullRequest, Team, User};

#[derive(Default)]
struct State {
    teams: HashSet<String>,
    users: HashMap<String, User>,
    /// User ids in first-insert order, so rosters come back stable
    user_order: Vec<String>,
    pull_requests: HashMap<String, PullRequest>,
}

impl State {
    fn members_of<'a>(&'a self, team_name: &'a str) -> impl Iterator<Item = &'a User> + 'a {
        self.user_order
            .iter()
            .filter_map(|id| self.users.get(id))
            .filter(move |u| u.team_name == team_name)
    }
}

/// In-memory store implementing every storage trait.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamStore for InMemoryStore {
    async fn create(&self, team: &Team) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.teams.insert(team.name.clone());

        for member in &team.members {
            let mut user = member.clone();
            user.team_name.clone_from(&team.name);
            if state.users.insert(user.id.clone(), user).is_none() {
                state.user_order.push(member.id.clone());
            }
        }
        Ok(())
    }

    async fn get_by_name(&self, name: &str) -> Result<Team, StoreError> {
        let state = self.state.read().await;
        if !state.teams.contains(name) {
            return Err(StoreError::not_found("team", name));
        }

        Ok(Team {
            name: name.to_owned(),
            members: state.members_of(name).cloned().collect(),
        })
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_by_id(&self, id: &str) -> Result<User, StoreError> {
        let state = self.state.read().await;
        state
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("user", &user.id)),
        }
    }

    async fn active_by_team(&self, team_name: &str) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .members_of(team_name)
            .filter(|u| u.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PullRequestStore for InMemoryStore {
    async fn create(&self, pr: &PullRequest) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.pull_requests.contains_key(&pr.id) {
            return Err(StoreError::Conflict {
                resource: "pull request",
                id: pr.id.clone(),
            });
        }
        state.pull_requests.insert(pr.id.clone(), pr.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<PullRequest, StoreError> {
        let state = self.state.read().await;
        state
            .pull_requests
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("pull request", id))
    }

    async fn update(&self, pr: &PullRequest) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match state.pull_requests.get_mut(&pr.id) {
            Some(stored) if stored.is_merged() && !pr.is_merged() => {
                Err(StoreError::Merged(pr.id.clone()))
            }
            Some(stored) => {
                stored.name.clone_from(&pr.name);
                stored.status = pr.status;
                stored.merged_at = pr.merged_at;
                stored.reviewer_ids.clone_from(&pr.reviewer_ids);
                Ok(())
            }
            None => Err(StoreError::not_found("pull request", &pr.id)),
        }
    }

    async fn by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>, StoreError> {
        let state = self.state.read().await;
        let mut prs: Vec<PullRequest> = state
            .pull_requests
            .values()
            .filter(|pr| pr.has_reviewer(user_id))
            .cloned()
            .collect();
        prs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(prs)
    }

    async fn statistics(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let state = self.state.read().await;
        let mut counts = BTreeMap::new();
        for reviewer in state.pull_requests.values().flat_map(|pr| &pr.reviewer_ids) {
            *counts.entry(reviewer.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
