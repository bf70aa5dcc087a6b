//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::{routing::get, Router};
use serde::Serialize;

use crate::http::envelope::Envelope;
use crate::http::server::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health - probes the connection provider
async fn health(State(state): State<Arc<AppState>>) -> Response {
    let healthy = match state.provider.check_health().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!(error = %e, "health probe failed");
            false
        }
    };

    let (status, code, message) = if healthy {
        ("ok", StatusCode::OK, "ok")
    } else {
        ("unavailable", StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
    };

    Envelope::new(
        message,
        HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
        },
    )
    .with_status(code)
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
