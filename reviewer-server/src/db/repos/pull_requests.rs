//! Pull request repository
//!
//! The PR row and its reviewer links are always written together in one
//! transaction. Reviewer order is kept in the `position` column.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewer_core::{PullRequest, PullRequestStore, StoreError};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::{is_unique_violation, DbError};

/// Pull request with its aggregated reviewer list
#[derive(Debug, Clone, FromRow)]
pub struct PullRequestRow {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub reviewer_ids: Vec<String>,
}

impl TryFrom<PullRequestRow> for PullRequest {
    type Error = DbError;

    fn try_from(row: PullRequestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|_| DbError::Corrupt(format!("pull request '{}' has status '{}'", row.id, row.status)))?;

        Ok(PullRequest {
            id: row.id,
            name: row.name,
            author_id: row.author_id,
            status,
            reviewer_ids: row.reviewer_ids,
            created_at: Some(row.created_at),
            merged_at: row.merged_at,
        })
    }
}

const SELECT_WITH_REVIEWERS: &str = r#"
    SELECT
        p.id,
        p.name,
        p.author_id,
        p.status,
        p.created_at,
        p.merged_at,
        COALESCE(
            array_agg(r.reviewer_id ORDER BY r.position) FILTER (WHERE r.reviewer_id IS NOT NULL),
            '{}'
        ) AS reviewer_ids
    FROM pull_requests p
    LEFT JOIN pull_request_reviewers r ON r.pull_request_id = p.id
"#;

/// Pull request repository
#[derive(Clone)]
pub struct PullRequestRepo {
    pool: PgPool,
}

impl PullRequestRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert PR row and reviewer links (atomic).
    pub async fn insert(&self, pr: &PullRequest) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pull_requests (id, name, author_id, status, created_at, merged_at)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6)
            "#,
        )
        .bind(&pr.id)
        .bind(&pr.name)
        .bind(&pr.author_id)
        .bind(pr.status.as_str())
        .bind(pr.created_at)
        .bind(pr.merged_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::Conflict {
                    resource: "pull request",
                    id: pr.id.clone(),
                }
            } else {
                e.into()
            }
        })?;

        insert_reviewers(&mut tx, &pr.id, &pr.reviewer_ids).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Update status/name and replace reviewer links (atomic).
    ///
    /// A merged row only accepts MERGED snapshots; an OPEN one fails with
    /// [`DbError::Merged`] and nothing is written.
    pub async fn save(&self, pr: &PullRequest) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE pull_requests
            SET name = $1, status = $2, merged_at = $3
            WHERE id = $4 AND (status = 'OPEN' OR $2 = 'MERGED')
            "#,
        )
        .bind(&pr.name)
        .bind(pr.status.as_str())
        .bind(pr.merged_at)
        .bind(&pr.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Either missing, or merged concurrently and this is a stale OPEN snapshot
            let exists: Option<(String,)> =
                sqlx::query_as("SELECT id FROM pull_requests WHERE id = $1")
                    .bind(&pr.id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match exists {
                Some(_) => DbError::Merged(pr.id.clone()),
                None => DbError::NotFound {
                    resource: "pull request",
                    id: pr.id.clone(),
                },
            });
        }

        sqlx::query("DELETE FROM pull_request_reviewers WHERE pull_request_id = $1")
            .bind(&pr.id)
            .execute(&mut *tx)
            .await?;

        insert_reviewers(&mut tx, &pr.id, &pr.reviewer_ids).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<PullRequest, DbError> {
        let query = format!("{SELECT_WITH_REVIEWERS} WHERE p.id = $1 GROUP BY p.id");
        let row: PullRequestRow = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: "pull request",
                id: id.to_owned(),
            })?;

        row.try_into()
    }

    /// PRs the user currently reviews, oldest first.
    pub async fn list_for_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>, DbError> {
        let query = format!(
            r#"{SELECT_WITH_REVIEWERS}
            WHERE p.id IN (
                SELECT pull_request_id FROM pull_request_reviewers WHERE reviewer_id = $1
            )
            GROUP BY p.id
            ORDER BY p.created_at, p.id"#
        );
        let rows: Vec<PullRequestRow> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Reviewer link count per user.
    pub async fn reviewer_counts(&self) -> Result<BTreeMap<String, u64>, DbError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT reviewer_id, COUNT(*) AS count
            FROM pull_request_reviewers
            GROUP BY reviewer_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, count)| (user_id, count.max(0) as u64))
            .collect())
    }
}

/// Insert reviewer links keeping list order in `position`.
async fn insert_reviewers(
    tx: &mut Transaction<'_, Postgres>,
    pr_id: &str,
    reviewer_ids: &[String],
) -> Result<(), DbError> {
    if reviewer_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO pull_request_reviewers (pull_request_id, reviewer_id, position)
        SELECT $1, reviewer_id, ordinality::int
        FROM UNNEST($2::text[]) WITH ORDINALITY AS t(reviewer_id, ordinality)
        "#,
    )
    .bind(pr_id)
    .bind(reviewer_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl PullRequestStore for PullRequestRepo {
    async fn create(&self, pr: &PullRequest) -> Result<(), StoreError> {
        Ok(self.insert(pr).await?)
    }

    async fn get_by_id(&self, id: &str) -> Result<PullRequest, StoreError> {
        Ok(self.get(id).await?)
    }

    async fn update(&self, pr: &PullRequest) -> Result<(), StoreError> {
        Ok(self.save(pr).await?)
    }

    async fn by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>, StoreError> {
        Ok(self.list_for_reviewer(user_id).await?)
    }

    async fn statistics(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        Ok(self.reviewer_counts().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewer_core::PullRequestStatus;

    fn row(status: &str) -> PullRequestRow {
        PullRequestRow {
            id: "pr-1".into(),
            name: "Add search".into(),
            author_id: "u1".into(),
            status: status.into(),
            created_at: Utc::now(),
            merged_at: None,
            reviewer_ids: vec!["u2".into(), "u3".into()],
        }
    }

    #[test]
    fn row_converts_with_reviewer_order() {
        let pr: PullRequest = row("OPEN").try_into().unwrap();
        assert_eq!(pr.status, PullRequestStatus::Open);
        assert_eq!(pr.reviewer_ids, vec!["u2", "u3"]);
        assert!(pr.created_at.is_some());
    }

    #[test]
    fn unknown_status_is_corrupt() {
        let err = PullRequest::try_from(row("CLOSED")).unwrap_err();
        assert!(matches!(err, DbError::Corrupt(_)));
    }

    // Integration tests - run with DATABASE_URL set
    // cargo test -p reviewer-server -- --ignored

    mod database {
        use super::*;
        use crate::db::repos::TeamRepo;
        use crate::db::{create_pool, migrations};
        use reviewer_core::{Team, User};

        async fn repos() -> (TeamRepo, PullRequestRepo) {
            let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
            let pool = create_pool(&url).await.expect("pool creation failed");
            migrations::run(&pool).await.expect("migrations failed");
            (TeamRepo::new(pool.clone()), PullRequestRepo::new(pool))
        }

        async fn seed_team(teams: &TeamRepo) {
            let team = Team::new(
                "pr-repo-team",
                vec![
                    User::new("pr-repo-u1", "Alice", "", true),
                    User::new("pr-repo-u2", "Bob", "", true),
                    User::new("pr-repo-u3", "Carol", "", true),
                ],
            )
            .unwrap();
            teams.insert(&team).await.unwrap();
        }

        #[tokio::test]
        #[ignore = "requires database"]
        async fn reviewer_order_survives_update() {
            let (teams, prs) = repos().await;
            seed_team(&teams).await;

            let id = format!("pr-repo-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
            let mut pr = PullRequest::open(
                id.as_str(),
                "Order test",
                "pr-repo-u1",
                vec!["pr-repo-u3".into(), "pr-repo-u2".into()],
            );
            prs.insert(&pr).await.unwrap();

            let dup = prs.insert(&pr).await.unwrap_err();
            assert!(matches!(dup, DbError::Conflict { .. }));

            pr.replace_reviewer("pr-repo-u3", "pr-repo-u1");
            pr.merge();
            prs.save(&pr).await.unwrap();

            let stored = prs.get(&id).await.unwrap();
            assert_eq!(stored.reviewer_ids, vec!["pr-repo-u1", "pr-repo-u2"]);
            assert_eq!(stored.status, PullRequestStatus::Merged);
            assert!(stored.merged_at.is_some());
        }

        #[tokio::test]
        #[ignore = "requires database"]
        async fn open_snapshot_does_not_overwrite_merge() {
            let (teams, prs) = repos().await;
            seed_team(&teams).await;

            let id = format!("pr-repo-stale-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
            let stale = PullRequest::open(id.as_str(), "Stale", "pr-repo-u1", vec!["pr-repo-u2".into()]);
            prs.insert(&stale).await.unwrap();

            let mut merged = stale.clone();
            merged.merge();
            prs.save(&merged).await.unwrap();

            let mut reassigned = stale;
            reassigned.replace_reviewer("pr-repo-u2", "pr-repo-u3");
            let err = prs.save(&reassigned).await.unwrap_err();
            assert!(matches!(err, DbError::Merged(_)));

            let stored = prs.get(&id).await.unwrap();
            assert_eq!(stored.status, PullRequestStatus::Merged);
            assert_eq!(stored.reviewer_ids, vec!["pr-repo-u2"]);
        }

        #[tokio::test]
        #[ignore = "requires database"]
        async fn missing_pull_request_is_not_found() {
            let (_, prs) = repos().await;
            let err = prs.get("pr-repo-missing").await.unwrap_err();
            assert!(matches!(err, DbError::NotFound { resource: "pull request", .. }));
        }
    }
}
