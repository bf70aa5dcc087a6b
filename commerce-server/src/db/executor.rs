//! Statement executors
//!
//! A store issues every statement through an [`Executor`]. Two
//! implementations exist: [`PoolExecutor`] runs on any pooled connection
//! (autocommit), [`TxExecutor`] runs inside a transaction the manager owns.
//! Stores are generic over the executor, so the SQL is written once.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgQueryResult, PgRow};
use sqlx::{PgPool, Postgres};

use super::provider::Database;
use super::transaction::PgTransaction;

/// A parameterized statement ready to run.
pub type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Which executor a statement ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Pool,
    Transaction,
}

/// Capability to run parameterized statements.
#[async_trait]
pub trait Executor: Send + Sync {
    fn kind(&self) -> ExecutorKind;

    async fn execute<'q>(&self, query: PgQuery<'q>) -> Result<PgQueryResult, sqlx::Error>;

    async fn fetch_one<'q>(&self, query: PgQuery<'q>) -> Result<PgRow, sqlx::Error>;

    async fn fetch_optional<'q>(&self, query: PgQuery<'q>) -> Result<Option<PgRow>, sqlx::Error>;
}

/// Runs statements on the base pool.
#[derive(Debug, Clone)]
pub struct PoolExecutor {
    pool: PgPool,
}

impl PoolExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<&Database> for PoolExecutor {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}

#[async_trait]
impl Executor for PoolExecutor {
    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Pool
    }

    async fn execute<'q>(&self, query: PgQuery<'q>) -> Result<PgQueryResult, sqlx::Error> {
        query.execute(&self.pool).await
    }

    async fn fetch_one<'q>(&self, query: PgQuery<'q>) -> Result<PgRow, sqlx::Error> {
        query.fetch_one(&self.pool).await
    }

    async fn fetch_optional<'q>(&self, query: PgQuery<'q>) -> Result<Option<PgRow>, sqlx::Error> {
        query.fetch_optional(&self.pool).await
    }
}

/// Runs statements inside a borrowed transaction.
///
/// Holds a shared reference only; it cannot commit or roll back.
#[derive(Debug, Clone, Copy)]
pub struct TxExecutor<'t> {
    tx: &'t PgTransaction,
}

impl<'t> TxExecutor<'t> {
    pub fn new(tx: &'t PgTransaction) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl<'t> Executor for TxExecutor<'t> {
    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Transaction
    }

    async fn execute<'q>(&self, query: PgQuery<'q>) -> Result<PgQueryResult, sqlx::Error> {
        let mut conn = self.tx.lock().await;
        query.execute(&mut **conn).await
    }

    async fn fetch_one<'q>(&self, query: PgQuery<'q>) -> Result<PgRow, sqlx::Error> {
        let mut conn = self.tx.lock().await;
        query.fetch_one(&mut **conn).await
    }

    async fn fetch_optional<'q>(&self, query: PgQuery<'q>) -> Result<Option<PgRow>, sqlx::Error> {
        let mut conn = self.tx.lock().await;
        query.fetch_optional(&mut **conn).await
    }
}
