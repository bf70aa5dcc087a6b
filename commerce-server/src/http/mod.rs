//! HTTP server layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing and a per-request deadline
//! - Graceful shutdown
//! - `{message, data}` JSON envelopes for every response

pub mod server;
pub mod envelope;
pub mod error;
pub mod extractors;
pub mod routes;

pub use server::{router, run_server, serve, shutdown_signal, AppState, ServerConfig, ServerError};
pub use envelope::Envelope;
pub use error::ApiError;
