//! Database layer - connection provider, executors and backends
//!
//! # Design Principles
//!
//! - The provider owns the pool; nothing else closes it
//! - Stores run statements through an [`Executor`], never a raw pool
//! - Transactions are begun and finished by the transaction manager only
//! - Rely on DB constraints, classify conflicts - no check-then-insert

pub mod provider;
pub mod executor;
pub mod transaction;
pub mod memory;
pub mod migrations;

pub use provider::{ConnectionProvider, Database, DbConfig};
pub use executor::{Executor, ExecutorKind, PgQuery, PoolExecutor, TxExecutor};
pub use transaction::PgTransaction;
pub use memory::{MemoryDatabase, MemoryStats, MemoryTransaction};
pub use migrations::{Direction, MigrationError};
