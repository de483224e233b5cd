//! Team member

/// A user who can author pull requests and review teammates' work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        team_name: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active,
        }
    }

    /// Only active users are eligible for review duty.
    pub fn can_be_reviewer(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_user_cannot_review() {
        let mut user = User::new("u1", "Alice", "backend", true);
        assert!(user.can_be_reviewer());

        user.is_active = false;
        assert!(!user.can_be_reviewer());
    }
}
