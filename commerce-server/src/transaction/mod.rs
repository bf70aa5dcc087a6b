//! Transaction boundary ownership
//!
//! Stores execute, the manager commits. A [`TxBackend`] knows how to begin
//! and finish one native transaction; the [`TransactionManager`] decides
//! which of commit or rollback runs.

mod manager;

pub use manager::TransactionManager;

use async_trait::async_trait;

use crate::error::TransactionError;

/// A store that can begin and finish native transactions.
///
/// Implementations must roll the transaction back when a [`TxBackend::Tx`]
/// is dropped without having been passed to `commit` or `rollback`. The
/// manager relies on this for cancellation: a dropped future never leaves
/// an orphaned transaction behind.
#[async_trait]
pub trait TxBackend: Send + Sync {
    /// Handle to exactly one in-flight transaction.
    type Tx: Send + Sync + 'static;

    async fn begin(&self) -> Result<Self::Tx, TransactionError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), TransactionError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), TransactionError>;
}
