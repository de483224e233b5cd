//! API error type with IntoResponse
//!
//! Every failure is rendered as `{"error": {"code": ..., "message": ...}}`.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reviewer_core::Error;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Service error, status depends on the variant
    Domain(Error),

    /// Malformed body, missing field or bad query (400)
    BadRequest { message: String },

    /// Handler ran past the request timeout (504)
    Timeout { after: Duration },

    /// Middleware failure outside the service (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Domain(e) => match e {
                Error::TeamExists(_) => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
                Error::PrExists(_) => (StatusCode::CONFLICT, "PR_EXISTS"),
                Error::PrMerged(_) => (StatusCode::CONFLICT, "PR_MERGED"),
                Error::NotAssigned { .. } => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
                Error::NoCandidate(_) => (StatusCode::CONFLICT, "NO_CANDIDATE"),
                Error::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                Error::Invalid { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::BadRequest { message } => message.clone(),
            Self::Timeout { after } => {
                tracing::warn!(?after, "request timed out");
                format!("request timed out after {after:?}")
            }
            Self::Internal { message } => {
                tracing::error!(error = %message, "request failed");
                "an internal error occurred".to_string()
            }
            Self::Domain(e) if status.is_server_error() => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "request failed");
                "an internal error occurred".to_string()
            }
            Self::Domain(e) => {
                tracing::debug!(code, error = %e, "request rejected");
                e.to_string()
            }
        };

        let body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Domain(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use reviewer_core::StoreError;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn team_exists_is_400() {
        let (status, body) = render(Error::TeamExists("backend".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "TEAM_EXISTS");
        assert_eq!(body["error"]["message"], "team 'backend' already exists");
    }

    #[tokio::test]
    async fn lifecycle_conflicts_are_409() {
        let cases = [
            (Error::PrExists("pr-1".into()), "PR_EXISTS"),
            (Error::PrMerged("pr-1".into()), "PR_MERGED"),
            (
                Error::NotAssigned {
                    pr_id: "pr-1".into(),
                    reviewer_id: "u9".into(),
                },
                "NOT_ASSIGNED",
            ),
            (Error::NoCandidate("pr-1".into()), "NO_CANDIDATE"),
        ];

        for (err, code) in cases {
            let (status, body) = render(err.into()).await;
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(body["error"]["code"], code);
        }
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err = Error::NotFound {
            resource: "team",
            id: "ghosts".into(),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn storage_error_hides_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err = Error::Storage(StoreError::backend(cause));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "an internal error occurred");
    }

    #[tokio::test]
    async fn timeout_is_504_with_error_body() {
        let err = ApiError::Timeout {
            after: Duration::from_secs(10),
        };
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"]["code"], "TIMEOUT");
        assert_eq!(body["error"]["message"], "request timed out after 10s");
    }

    #[tokio::test]
    async fn bad_request_keeps_message() {
        let (status, body) = render(ApiError::bad_request("team_name is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "team_name is required");
    }
}
