//! API error types with IntoResponse
//!
//! Domain errors keep their kind up to here and are mapped to a status
//! code once. Infrastructure failures are logged and answered with a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::envelope::Envelope;
use crate::error::DomainError;
use crate::models::Problems;

const GENERIC_MESSAGE: &str = "an internal error occurred";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Classified domain failure
    Domain(DomainError),

    /// Body was not valid JSON for the endpoint (400)
    MalformedBody(String),

    /// Request deadline exceeded (503)
    TimedOut(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain(e) => match e {
                DomainError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Conflict { .. } => StatusCode::CONFLICT,
                DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
                DomainError::Transaction(_)
                | DomainError::Connection(_)
                | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::TimedOut(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            Self::Domain(DomainError::ValidationFailed(problems)) => {
                Envelope::<Problems>::new("validation failed", problems).with_status(status)
            }
            Self::Domain(e) if e.is_infrastructure() => {
                // Log the actual error, return generic message
                tracing::error!(kind = e.kind(), error = %e, "request failed");
                Envelope::message(GENERIC_MESSAGE).with_status(status)
            }
            Self::Domain(e) => Envelope::message(e.to_string()).with_status(status),
            Self::MalformedBody(reason) => {
                Envelope::message(format!("malformed request body: {reason}")).with_status(status)
            }
            Self::TimedOut(message) => Envelope::message(message).with_status(status),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self::Domain(e)
    }
}
