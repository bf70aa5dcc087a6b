//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - A deadline on every request
//! - Graceful shutdown on SIGTERM/Ctrl+C, bounded by a grace period

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;
use crate::db::ConnectionProvider;
use crate::service::Authenticator;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,

    /// Deadline for a single request
    pub handler_timeout: Duration,

    /// Message returned with 503 when a request hits the deadline
    pub timeout_message: String,

    /// How long in-flight requests may drain after a shutdown signal
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_permissive: false,
            handler_timeout: Duration::from_secs(10),
            timeout_message: "request timed out".to_owned(),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub auth: Arc<dyn Authenticator>,
    pub provider: Arc<dyn ConnectionProvider>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        provider: Arc<dyn ConnectionProvider>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            auth,
            provider,
            request_timeout,
        }
    }
}

#[derive(Clone)]
struct Deadline {
    limit: Duration,
    message: Arc<str>,
}

/// Drop the handler future once the deadline passes. Any transaction it
/// held rolls back with it.
async fn enforce_deadline(
    State(deadline): State<Deadline>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    match tokio::time::timeout(deadline.limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%path, limit = ?deadline.limit, "request deadline exceeded");
            ApiError::TimedOut(deadline.message.to_string()).into_response()
        }
    }
}

fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }

    // Localhost only
    CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:8080"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
            HeaderValue::from_static("http://127.0.0.1:8080"),
        ])
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let deadline = Deadline {
        limit: config.handler_timeout,
        message: Arc::from(config.timeout_message.as_str()),
    };

    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::diagnostics::router());

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(deadline, enforce_deadline))
        .layer(cors_layer(config.cors_permissive))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve on `listener` until `shutdown` resolves, then drain for at most
/// the grace period and close the connection provider exactly once.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    config: ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let provider = Arc::clone(&state.provider);
    let app = router(state, &config);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    let served = tokio::select! {
        result = &mut server => result,
        _ = shutdown => {
            let _ = stop_tx.send(());
            match tokio::time::timeout(config.shutdown_grace, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(grace = ?config.shutdown_grace, "grace period elapsed, abandoning in-flight requests");
                    Ok(())
                }
            }
        }
    };

    tracing::warn!("server shutdown");

    if let Err(e) = provider.disconnect().await {
        tracing::error!(error = %e, "closing database failed");
    } else {
        tracing::warn!("database closed");
    }

    served.map_err(ServerError::Io)
}

/// Bind `config.bind_addr` and serve until Ctrl+C or SIGTERM.
///
/// # Example
///
/// ```ignore
/// let state = AppState::new(auth, provider, config.handler_timeout);
/// run_server(state, config).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    serve(listener, state, config, shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
