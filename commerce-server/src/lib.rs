//! commerce-server: transactional service orchestration for an e-commerce backend
//!
//! Layers, leaves first:
//! - [`db`]: connection provider, executors, Postgres and in-memory backends
//! - [`store`]: one store per aggregate, bound to the pool or a transaction
//! - [`transaction`]: the manager that owns every commit and rollback
//! - [`service`]: business operations as units of work
//! - [`http`]: axum routes, envelopes and error mapping

pub mod app;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;
pub mod transaction;

pub use config::{AppConfig, DatabaseBackend};
pub use error::{ConnectionError, DomainError, DomainResult, TransactionError};
