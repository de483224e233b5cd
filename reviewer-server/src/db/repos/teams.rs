//! Team repository
//!
//! - create: team row with ON CONFLICT DO NOTHING, members upserted, one
//!   transaction
//! - get: team row plus members in insertion order

use async_trait::async_trait;
use reviewer_core::{StoreError, Team, TeamStore};
use sqlx::PgPool;

use super::users::UserRow;
use super::DbError;

/// Team repository
#[derive(Clone)]
pub struct TeamRepo {
    pool: PgPool,
}

impl TeamRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the team (idempotent) and upsert every member.
    ///
    /// A concurrent create with the same name cannot produce a second team
    /// row; the later writer's member fields win.
    pub async fn insert(&self, team: &Team) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO teams (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(&team.name)
            .execute(&mut *tx)
            .await?;

        for member in &team.members {
            sqlx::query(
                r#"
                INSERT INTO users (id, username, team_name, is_active)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE
                SET username = EXCLUDED.username,
                    team_name = EXCLUDED.team_name,
                    is_active = EXCLUDED.is_active
                "#,
            )
            .bind(&member.id)
            .bind(&member.username)
            .bind(&team.name)
            .bind(member.is_active)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get a team with its current members.
    pub async fn get(&self, name: &str) -> Result<Team, DbError> {
        let (team_name,): (String,) = sqlx::query_as("SELECT name FROM teams WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: "team",
                id: name.to_owned(),
            })?;

        let members: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, team_name, is_active
            FROM users
            WHERE team_name = $1
            ORDER BY seq
            "#,
        )
        .bind(&team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(Team {
            name: team_name,
            members: members.into_iter().map(Into::into).collect(),
        })
    }
}

#[async_trait]
impl TeamStore for TeamRepo {
    async fn create(&self, team: &Team) -> Result<(), StoreError> {
        Ok(self.insert(team).await?)
    }

    async fn get_by_name(&self, name: &str) -> Result<Team, StoreError> {
        Ok(self.get(name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations};
    use reviewer_core::User;

    // Integration tests - run with DATABASE_URL set
    // cargo test -p reviewer-server -- --ignored

    async fn repo() -> TeamRepo {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations failed");
        TeamRepo::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_team_idempotent() {
        let repo = repo().await;
        let team = Team::new(
            "repo-test-team",
            vec![User::new("repo-test-u1", "Alice", "", true)],
        )
        .unwrap();

        repo.insert(&team).await.unwrap();
        repo.insert(&team).await.unwrap();

        let stored = repo.get("repo-test-team").await.unwrap();
        assert_eq!(stored.members.len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn missing_team_is_not_found() {
        let repo = repo().await;
        let err = repo.get("repo-test-missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "team", .. }));
    }
}
