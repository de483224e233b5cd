//! Pull request endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use reviewer_core::PullRequest;
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::extractors::{required, ApiJson};
use crate::http::server::AppState;

/// Full pull request, timestamps in RFC 3339
#[derive(Debug, Serialize)]
pub struct PullRequestDto {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: &'static str,
    pub assigned_reviewers: Vec<String>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "mergedAt", skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<String>,
}

impl From<PullRequest> for PullRequestDto {
    fn from(pr: PullRequest) -> Self {
        Self {
            status: pr.status.as_str(),
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            assigned_reviewers: pr.reviewer_ids,
            created_at: pr.created_at.map(|t| t.to_rfc3339()),
            merged_at: pr.merged_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Listing form without reviewers or timestamps
#[derive(Debug, Serialize)]
pub struct PullRequestShortDto {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: &'static str,
}

impl From<PullRequest> for PullRequestShortDto {
    fn from(pr: PullRequest) -> Self {
        Self {
            status: pr.status.as_str(),
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
        }
    }
}

#[derive(Deserialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Deserialize)]
pub struct MergeRequest {
    pub pull_request_id: String,
}

#[derive(Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

#[derive(Serialize)]
pub struct PullRequestResponse {
    pub pr: PullRequestDto,
}

#[derive(Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequestDto,
    pub replaced_by: String,
}

/// POST /pullRequest/create - open a PR and assign reviewers
async fn create_pull_request(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePullRequestRequest>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiError> {
    let pr_id = required("pull_request_id", &req.pull_request_id)?;
    let author_id = required("author_id", &req.author_id)?;

    let pr = state
        .service
        .create_pr(pr_id, &req.pull_request_name, author_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PullRequestResponse { pr: pr.into() }),
    ))
}

/// POST /pullRequest/merge - idempotent
async fn merge_pull_request(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<MergeRequest>,
) -> Result<Json<PullRequestResponse>, ApiError> {
    let pr_id = required("pull_request_id", &req.pull_request_id)?;
    let pr = state.service.merge_pr(pr_id).await?;
    Ok(Json(PullRequestResponse { pr: pr.into() }))
}

/// POST /pullRequest/reassign
async fn reassign_reviewer(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ReassignRequest>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let pr_id = required("pull_request_id", &req.pull_request_id)?;
    let old_user_id = required("old_user_id", &req.old_user_id)?;

    let (pr, replaced_by) = state.service.reassign_reviewer(pr_id, old_user_id).await?;
    Ok(Json(ReassignResponse {
        pr: pr.into(),
        replaced_by,
    }))
}

/// Pull request routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_pr_omits_merged_at() {
        let pr = PullRequest::open("pr-1", "Add search", "u1", vec!["u2".into()]);
        let json = serde_json::to_value(PullRequestDto::from(pr)).unwrap();

        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["assigned_reviewers"], serde_json::json!(["u2"]));
        assert!(json.get("createdAt").is_some());
        assert!(json.get("mergedAt").is_none());
    }

    #[test]
    fn short_form_has_four_fields() {
        let pr = PullRequest::open("pr-1", "Add search", "u1", vec![]);
        let json = serde_json::to_value(PullRequestShortDto::from(pr)).unwrap();

        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert_eq!(object["pull_request_name"], "Add search");
    }
}
