//! Error taxonomy for commerce-server
//!
//! Every failure surfaced above the store boundary is a [`DomainError`].
//! Backend errors (sqlx, the in-memory engine) are classified where they
//! occur and never travel further in raw form.

use std::time::Duration;

use thiserror::Error;

use crate::models::Problems;

/// Boxed cause carried by infrastructure errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type DomainResult<T> = Result<T, DomainError>;

/// Classified failure kinds, from store to HTTP boundary.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("validation failed: {} problem(s)", .0.len())]
    ValidationFailed(Problems),

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("{resource} with this {field} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
    },

    #[error("invalid credentials")]
    Unauthorized,

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("internal error: {0}")]
    Internal(#[source] BoxError),
}

impl DomainError {
    pub fn internal(cause: impl Into<BoxError>) -> Self {
        Self::Internal(cause.into())
    }

    /// Short machine-readable kind, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "validation_failed",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Unauthorized => "unauthorized",
            Self::Transaction(_) => "transaction",
            Self::Connection(_) => "connection",
            Self::Internal(_) => "internal",
        }
    }

    /// True for failures of the infrastructure rather than the request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Transaction(_) | Self::Connection(_) | Self::Internal(_)
        )
    }
}

/// Failures of the transaction machinery itself.
///
/// Distinct from business errors: a unit of work's own error is returned
/// unchanged, these are only produced by begin, commit and deadlines.
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] BoxError),

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] BoxError),

    #[error("failed to roll back transaction: {0}")]
    Rollback(#[source] BoxError),

    #[error("transaction exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl TransactionError {
    pub fn begin(cause: impl Into<BoxError>) -> Self {
        Self::Begin(cause.into())
    }

    pub fn commit(cause: impl Into<BoxError>) -> Self {
        Self::Commit(cause.into())
    }

    pub fn rollback(cause: impl Into<BoxError>) -> Self {
        Self::Rollback(cause.into())
    }
}

/// Failures of the connection provider.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("database health check failed: {0}")]
    Unhealthy(#[source] sqlx::Error),

    #[error("database did not respond within {0:?}")]
    TimedOut(Duration),

    #[error("database connection is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_display_names_field() {
        let err = DomainError::Conflict {
            resource: "user",
            field: "email",
        };
        assert_eq!(err.to_string(), "user with this email already exists");
        assert_eq!(err.kind(), "conflict");
        assert!(!err.is_infrastructure());
    }

    #[test]
    fn transaction_errors_stay_distinguishable() {
        let err: DomainError = TransactionError::commit("connection reset").into();
        assert!(matches!(err, DomainError::Transaction(TransactionError::Commit(_))));
        assert!(err.is_infrastructure());
        assert_eq!(err.to_string(), "failed to commit transaction: connection reset");
    }

    #[test]
    fn validation_display_counts_problems() {
        let mut problems = Problems::new();
        problems.insert("email", "must not be empty");
        problems.insert("name", "must not be empty");
        let err = DomainError::ValidationFailed(problems);
        assert_eq!(err.to_string(), "validation failed: 2 problem(s)");
    }
}
