//! Run units of work inside one native transaction.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::TxBackend;
use crate::error::TransactionError;

/// Owns the transaction boundary for services.
///
/// Holds no mutable state besides the backend (a pool handle), so it is
/// cheap to clone and safe to share across concurrent requests: every call
/// to [`run_in_transaction`](Self::run_in_transaction) begins its own
/// transaction.
#[derive(Debug, Clone)]
pub struct TransactionManager<B> {
    backend: B,
    deadline: Option<Duration>,
}

impl<B: TxBackend> TransactionManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            deadline: None,
        }
    }

    /// Bound every unit of work by `deadline`. Expiry rolls back.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Run `work` in a fresh transaction.
    ///
    /// - `Ok` from `work`: commit. A failed commit is reported as
    ///   [`TransactionError::Commit`].
    /// - `Err` from `work`: roll back and return that error unchanged.
    /// - `work` panics: roll back, then resume the panic.
    /// - deadline expires: roll back, [`TransactionError::DeadlineExceeded`].
    /// - this future is dropped: the handle is dropped, which rolls back.
    ///
    /// Exactly one of commit or rollback happens on every path.
    ///
    /// The handle is lent to `work` for the duration of the call and cannot
    /// escape it. Beginning another transaction from inside `work` is a
    /// precondition violation; units of work do not nest.
    ///
    /// ```ignore
    /// let id = manager
    ///     .run_in_transaction(move |tx| {
    ///         Box::pin(async move {
    ///             let id = users.bind(tx).create(new_user).await?;
    ///             Ok::<_, DomainError>(id)
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn run_in_transaction<R, E, F>(&self, work: F) -> Result<R, E>
    where
        F: for<'t> FnOnce(&'t B::Tx) -> BoxFuture<'t, Result<R, E>> + Send,
        R: Send,
        E: From<TransactionError> + Send,
    {
        let tx = self.backend.begin().await?;

        let outcome = {
            let work = AssertUnwindSafe(work(&tx)).catch_unwind();
            match self.deadline {
                Some(limit) => tokio::time::timeout(limit, work)
                    .await
                    .map_err(|_| limit),
                None => Ok(work.await),
            }
        };

        match outcome {
            Ok(Ok(Ok(value))) => {
                self.backend.commit(tx).await?;
                tracing::debug!("transaction committed");
                Ok(value)
            }
            Ok(Ok(Err(err))) => {
                if let Err(rollback_err) = self.backend.rollback(tx).await {
                    tracing::error!(error = %rollback_err, "rollback after failed unit of work failed");
                } else {
                    tracing::debug!("transaction rolled back");
                }
                Err(err)
            }
            Ok(Err(panic)) => {
                if let Err(rollback_err) = self.backend.rollback(tx).await {
                    tracing::error!(error = %rollback_err, "rollback after panic failed");
                } else {
                    tracing::warn!("unit of work panicked, transaction rolled back");
                }
                std::panic::resume_unwind(panic)
            }
            Err(limit) => {
                if let Err(rollback_err) = self.backend.rollback(tx).await {
                    tracing::error!(error = %rollback_err, "rollback after deadline failed");
                } else {
                    tracing::warn!(deadline = ?limit, "transaction deadline exceeded, rolled back");
                }
                Err(TransactionError::DeadlineExceeded(limit).into())
            }
        }
    }
}
