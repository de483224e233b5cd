//! Schema migrations
//!
//! Every statement is idempotent, so running on startup is safe.

use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        name TEXT PRIMARY KEY CHECK (name <> ''),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        seq BIGSERIAL,
        username TEXT NOT NULL,
        team_name TEXT NOT NULL REFERENCES teams(name),
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS users_team_name_idx ON users (team_name) WHERE is_active",
    r#"
    CREATE TABLE IF NOT EXISTS pull_requests (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        author_id TEXT NOT NULL REFERENCES users(id),
        status TEXT NOT NULL DEFAULT 'OPEN' CHECK (status IN ('OPEN', 'MERGED')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        merged_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pull_request_reviewers (
        pull_request_id TEXT NOT NULL REFERENCES pull_requests(id) ON DELETE CASCADE,
        reviewer_id TEXT NOT NULL REFERENCES users(id),
        position INT NOT NULL,
        PRIMARY KEY (pull_request_id, reviewer_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS pull_request_reviewers_reviewer_idx ON pull_request_reviewers (reviewer_id)",
];

/// Create all tables and indexes in one transaction.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(*statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("Migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");

        run(&pool).await.expect("first run failed");
        run(&pool).await.expect("second run failed");
    }
}
