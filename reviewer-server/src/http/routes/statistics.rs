//! Assignment statistics endpoint

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct UserStatistic {
    pub user_id: String,
    pub assignments_count: u64,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub by_users: Vec<UserStatistic>,
    pub total_assignments: u64,
}

impl From<BTreeMap<String, u64>> for StatisticsResponse {
    /// Busiest reviewers first, ties by user id.
    fn from(counts: BTreeMap<String, u64>) -> Self {
        let total_assignments = counts.values().sum();

        let mut by_users: Vec<UserStatistic> = counts
            .into_iter()
            .map(|(user_id, assignments_count)| UserStatistic {
                user_id,
                assignments_count,
            })
            .collect();
        // BTreeMap order is by id already; stable sort keeps it for ties
        by_users.sort_by(|a, b| b.assignments_count.cmp(&a.assignments_count));

        Self {
            by_users,
            total_assignments,
        }
    }
}

/// GET /statistics
async fn statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let counts = state.service.get_statistics().await?;
    Ok(Json(counts.into()))
}

/// Statistics routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/statistics", get(statistics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_by_count_then_id() {
        let counts = BTreeMap::from([
            ("u3".to_string(), 1),
            ("u1".to_string(), 2),
            ("u2".to_string(), 1),
        ]);

        let response = StatisticsResponse::from(counts);
        let order: Vec<_> = response.by_users.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(order, ["u1", "u2", "u3"]);
        assert_eq!(response.total_assignments, 4);
    }

    #[test]
    fn empty_statistics() {
        let response = StatisticsResponse::from(BTreeMap::new());
        assert!(response.by_users.is_empty());
        assert_eq!(response.total_assignments, 0);
    }
}
