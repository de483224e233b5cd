//! Team with its member roster

use super::User;
use crate::error::{Error, Result};

/// A named group of users that review each other's pull requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub members: Vec<User>,
}

impl Team {
    /// Build a team, validating the name and pinning every member to it.
    ///
    /// Members keep their order. A member's `team_name` is overwritten with
    /// the team's name so the roster can never disagree with its team.
    pub fn new(name: impl Into<String>, members: Vec<User>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Invalid {
                field: "team_name",
                reason: "cannot be empty",
            });
        }

        let members = members
            .into_iter()
            .map(|mut member| {
                member.team_name.clone_from(&name);
                member
            })
            .collect();

        Ok(Self { name, members })
    }

    pub fn active_members(&self) -> impl Iterator<Item = &User> {
        self.members.iter().filter(|m| m.can_be_reviewer())
    }
}
