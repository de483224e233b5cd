//! PostgreSQL pool for the repositories
//!
//! One pool is shared by every repository and by the health check.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Used when the config does not say otherwise
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a request waits for a free connection before failing
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect with the default connection limit.
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/pr_reviewer").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Connect with at most `max_connections` open connections.
///
/// Fails if the first connection cannot be established.
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query; used by `GET /health`.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
