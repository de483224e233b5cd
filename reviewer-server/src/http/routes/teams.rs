//! Team endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reviewer_core::{Team, User};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::extractors::{required, ApiJson, ApiQuery};
use crate::http::server::AppState;

/// Team member as sent and returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamMemberDto {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamDto {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMemberDto>,
}

impl From<Team> for TeamDto {
    fn from(team: Team) -> Self {
        Self {
            team_name: team.name,
            members: team
                .members
                .into_iter()
                .map(|u| TeamMemberDto {
                    user_id: u.id,
                    username: u.username,
                    is_active: u.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct CreateTeamResponse {
    pub team: TeamDto,
}

#[derive(Deserialize)]
pub struct TeamQuery {
    pub team_name: String,
}

/// POST /team/add - create a team and upsert its members
async fn create_team(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<TeamDto>,
) -> Result<(StatusCode, Json<CreateTeamResponse>), ApiError> {
    let team_name = required("team_name", &req.team_name)?;

    let mut members = Vec::with_capacity(req.members.len());
    for member in &req.members {
        let user_id = required("user_id", &member.user_id)?;
        let username = required("username", &member.username)?;
        members.push(User::new(user_id, username, team_name, member.is_active));
    }

    let team = state.service.create_team(team_name, members).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse { team: team.into() }),
    ))
}

/// GET /team/get?team_name=... - team with its members
async fn get_team(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TeamQuery>,
) -> Result<Json<TeamDto>, ApiError> {
    let team_name = required("team_name", &query.team_name)?;
    let team = state.service.get_team(team_name).await?;
    Ok(Json(team.into()))
}

/// Team routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/team/add", post(create_team))
        .route("/team/get", get(get_team))
}
