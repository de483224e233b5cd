//! Pull request lifecycle
//!
//! Status only ever moves OPEN -> MERGED. The reviewer list is an ordered
//! list of user ids; slot positions are stable across reassignment.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PullRequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            _ => Err(Error::Invalid {
                field: "status",
                reason: "must be OPEN or MERGED",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    pub reviewer_ids: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// A freshly opened pull request.
    pub fn open(
        id: impl Into<String>,
        name: impl Into<String>,
        author_id: impl Into<String>,
        reviewer_ids: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open,
            reviewer_ids,
            created_at: Some(Utc::now()),
            merged_at: None,
        }
    }

    /// Reviewers may only be swapped while the pull request is open.
    pub fn can_reassign(&self) -> bool {
        self.status == PullRequestStatus::Open
    }

    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.reviewer_ids.iter().any(|id| id == user_id)
    }

    /// Mark merged. Returns false if it already was.
    pub fn merge(&mut self) -> bool {
        if self.is_merged() {
            return false;
        }
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(Utc::now());
        true
    }

    /// Put `new_id` into the slot held by `old_id`. Returns false if
    /// `old_id` holds no slot.
    pub fn replace_reviewer(&mut self, old_id: &str, new_id: impl Into<String>) -> bool {
        match self.reviewer_ids.iter_mut().find(|id| id.as_str() == old_id) {
            Some(slot) => {
                *slot = new_id.into();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr() -> PullRequest {
        PullRequest::open("pr-1", "Add search", "u1", vec!["u2".into(), "u3".into()])
    }

    #[test]
    fn open_pr_can_be_reassigned() {
        let pr = pr();
        assert!(pr.can_reassign());
        assert!(!pr.is_merged());
        assert!(pr.created_at.is_some());
        assert!(pr.merged_at.is_none());
    }

    #[test]
    fn merge_is_one_way() {
        let mut pr = pr();
        assert!(pr.merge());
        let merged_at = pr.merged_at;
        assert!(pr.is_merged());
        assert!(!pr.can_reassign());

        assert!(!pr.merge());
        assert_eq!(pr.merged_at, merged_at);
    }

    #[test]
    fn has_reviewer_checks_membership() {
        let pr = pr();
        assert!(pr.has_reviewer("u2"));
        assert!(!pr.has_reviewer("u1"));
    }

    #[test]
    fn replace_keeps_position() {
        let mut pr = pr();
        assert!(pr.replace_reviewer("u2", "u4"));
        assert_eq!(pr.reviewer_ids, vec!["u4", "u3"]);

        assert!(!pr.replace_reviewer("u9", "u5"));
        assert_eq!(pr.reviewer_ids, vec!["u4", "u3"]);
    }

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!("OPEN".parse::<PullRequestStatus>().unwrap(), PullRequestStatus::Open);
        assert_eq!(PullRequestStatus::Merged.to_string(), "MERGED");
        assert!("closed".parse::<PullRequestStatus>().is_err());
    }
}
