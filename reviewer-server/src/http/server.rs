//! Axum server setup
//!
//! Router with tracing and a per-request timeout, served with graceful
//! shutdown on SIGTERM/Ctrl+C. In-flight requests get the same timeout as
//! a grace period before the server stops waiting for them.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::{BoxError, Router};
use reviewer_core::AssignmentService;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::timeout::error::Elapsed;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;
use crate::config::HttpConfig;
use crate::db;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` to bind (default: localhost:8080)
    pub bind_addr: String,

    /// Per-request timeout and shutdown grace period (default: 10s)
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        HttpConfig::default().into()
    }
}

impl From<HttpConfig> for ServerConfig {
    fn from(http: HttpConfig) -> Self {
        Self {
            bind_addr: http.address,
            request_timeout: http.timeout,
        }
    }
}

/// Storage the service runs on, as reported by `GET /health`
#[derive(Debug, Clone)]
pub enum Backend {
    Memory,
    Postgres(PgPool),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Whether storage is reachable right now.
    pub async fn check(&self) -> Result<(), sqlx::Error> {
        match self {
            Self::Memory => Ok(()),
            Self::Postgres(pool) => db::ping(pool).await,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub service: AssignmentService,
    pub backend: Backend,
}

impl AppState {
    pub fn new(service: AssignmentService, backend: Backend) -> Arc<Self> {
        Arc::new(Self { service, backend })
    }
}

/// Build the full API router.
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let api = Router::new()
        .merge(routes::health::router())
        .merge(routes::teams::router())
        .merge(routes::users::router())
        .merge(routes::pull_requests::router())
        .merge(routes::statistics::router());

    with_timeout(api, request_timeout)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Abort handlers that run longer than `timeout`; the client gets the usual
/// JSON error body.
pub fn with_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                if err.is::<Elapsed>() {
                    ApiError::Timeout { after: timeout }
                } else {
                    ApiError::Internal {
                        message: err.to_string(),
                    }
                }
            }))
            .timeout(timeout),
    )
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
///
/// # Example
///
/// ```ignore
/// let service = reviewer_server::db::assignment_service(&pool);
/// let state = AppState::new(service, Backend::Postgres(pool));
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: Arc<AppState>, config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    tracing::info!(
        "Server listening on {} ({})",
        listener.local_addr()?,
        config.bind_addr
    );

    serve(listener, state, config.request_timeout, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    request_timeout: Duration,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state, request_timeout);

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        Ok(()) = signalled_rx => {
            match tokio::time::timeout(request_timeout, &mut server).await {
                Ok(result) => result?,
                Err(_) => tracing::warn!(
                    grace_secs = request_timeout.as_secs(),
                    "shutdown grace period elapsed, dropping open connections"
                ),
            }
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use reviewer_core::InMemoryStore;
    use tower::ServiceExt;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let service = AssignmentService::from_store(Arc::new(InMemoryStore::new()));
        let state = AppState::new(service, Backend::Memory);

        serve(listener, state, Duration::from_secs(1), async {})
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handler_gets_json_timeout_error() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "late"
            }),
        );
        let app = with_timeout(slow, Duration::from_millis(50));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "TIMEOUT");
        assert_eq!(body["error"]["message"], "request timed out after 50ms");
    }
}
