//! Auth endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::{routing::post, Router};

use crate::http::envelope::Envelope;
use crate::http::error::ApiError;
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::models::{Identity, LoginInput, RegisterInput};

/// POST /auth/register - create an account
async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<RegisterInput>,
) -> Result<Response, ApiError> {
    let profile = state.auth.register(input).await?;
    Ok(Envelope::new("user registered", profile).with_status(StatusCode::CREATED))
}

/// POST /auth/login - check credentials
async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<LoginInput>,
) -> Result<Envelope<Identity>, ApiError> {
    let identity = state.auth.login(input).await?;
    Ok(Envelope::new("login successful", identity))
}

/// Auth routes, mounted under `/api/v1`
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}
