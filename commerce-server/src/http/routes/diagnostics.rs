//! Diagnostic endpoints

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::{routing::get, Router};

use crate::http::envelope::Envelope;
use crate::http::server::AppState;

/// GET /test
async fn hello() -> Envelope<()> {
    Envelope::message("hello, world")
}

/// GET /test/timeout - sleeps past the request deadline
async fn outlive_deadline(State(state): State<Arc<AppState>>) -> Envelope<()> {
    tokio::time::sleep(state.request_timeout + Duration::from_secs(1)).await;
    Envelope::message("this response should never be seen")
}

/// Diagnostic routes, mounted under `/api/v1`
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/test", get(hello))
        .route("/test/timeout", get(outlive_deadline))
}
