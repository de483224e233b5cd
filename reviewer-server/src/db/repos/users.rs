//! User repository

use async_trait::async_trait;
use reviewer_core::{StoreError, User, UserStore};
use sqlx::{FromRow, PgPool};

use super::DbError;

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            team_name: row.team_name,
            is_active: row.is_active,
        }
    }
}

/// User repository
#[derive(Clone)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<User, DbError> {
        let row: UserRow = sqlx::query_as(
            "SELECT id, username, team_name, is_active FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "user",
            id: id.to_owned(),
        })?;

        Ok(row.into())
    }

    pub async fn save(&self, user: &User) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $1, team_name = $2, is_active = $3
            WHERE id = $4
            "#,
        )
        .bind(&user.username)
        .bind(&user.team_name)
        .bind(user.is_active)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "user",
                id: user.id.clone(),
            });
        }
        Ok(())
    }

    /// Active members of a team, in insertion order.
    pub async fn list_active(&self, team_name: &str) -> Result<Vec<User>, DbError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, team_name, is_active
            FROM users
            WHERE team_name = $1 AND is_active
            ORDER BY seq
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl UserStore for UserRepo {
    async fn get_by_id(&self, id: &str) -> Result<User, StoreError> {
        Ok(self.get(id).await?)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        Ok(self.save(user).await?)
    }

    async fn active_by_team(&self, team_name: &str) -> Result<Vec<User>, StoreError> {
        Ok(self.list_active(team_name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_user() {
        let user: User = UserRow {
            id: "u1".into(),
            username: "Alice".into(),
            team_name: "backend".into(),
            is_active: false,
        }
        .into();

        assert_eq!(user, User::new("u1", "Alice", "backend", false));
        assert!(!user.can_be_reviewer());
    }

    // Integration tests - run with DATABASE_URL set
    // cargo test -p reviewer-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_unknown_user_is_not_found() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");

        let repo = UserRepo::new(pool);
        let ghost = User::new("user-repo-ghost", "Ghost", "nowhere", true);
        let err = repo.save(&ghost).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "user", .. }));
    }
}

