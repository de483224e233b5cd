//! User endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use reviewer_core::User;
use serde::{Deserialize, Serialize};

use super::pull_requests::PullRequestShortDto;
use crate::http::error::ApiError;
use crate::http::extractors::{required, ApiJson, ApiQuery};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id,
            username: u.username,
            team_name: u.team_name,
            is_active: u.is_active,
        }
    }
}

#[derive(Deserialize)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: UserDto,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShortDto>,
}

/// POST /users/setIsActive
async fn set_is_active(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SetIsActiveRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = required("user_id", &req.user_id)?;
    let user = state.service.set_user_active(user_id, req.is_active).await?;
    Ok(Json(UserResponse { user: user.into() }))
}

/// GET /users/getReview?user_id=... - PRs the user is reviewing
async fn get_review(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<UserReviewsResponse>, ApiError> {
    let user_id = required("user_id", &query.user_id)?;
    let pull_requests = state.service.get_user_reviews(user_id).await?;

    Ok(Json(UserReviewsResponse {
        user_id: user_id.to_owned(),
        pull_requests: pull_requests.into_iter().map(Into::into).collect(),
    }))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
}
