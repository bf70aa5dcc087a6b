//! PostgreSQL transaction handle

use std::fmt;

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use super::provider::Database;
use crate::error::TransactionError;
use crate::transaction::TxBackend;

/// One in-flight PostgreSQL transaction.
///
/// Stores only ever see `&PgTransaction`; the mutex serializes their
/// statements on the single underlying connection. Dropping the handle
/// without commit or rollback rolls the transaction back (sqlx queues the
/// rollback when the connection returns to the pool).
pub struct PgTransaction {
    conn: Mutex<Transaction<'static, Postgres>>,
}

impl PgTransaction {
    pub(crate) async fn lock(&self) -> MutexGuard<'_, Transaction<'static, Postgres>> {
        self.conn.lock().await
    }
}

impl fmt::Debug for PgTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgTransaction").finish_non_exhaustive()
    }
}

#[async_trait]
impl TxBackend for Database {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, TransactionError> {
        let tx = self.pool().begin().await.map_err(TransactionError::begin)?;
        Ok(PgTransaction {
            conn: Mutex::new(tx),
        })
    }

    async fn commit(&self, tx: PgTransaction) -> Result<(), TransactionError> {
        tx.conn
            .into_inner()
            .commit()
            .await
            .map_err(TransactionError::commit)
    }

    async fn rollback(&self, tx: PgTransaction) -> Result<(), TransactionError> {
        tx.conn
            .into_inner()
            .rollback()
            .await
            .map_err(TransactionError::rollback)
    }
}
