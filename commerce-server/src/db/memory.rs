//! In-memory relational backend
//!
//! Implements the provider, transaction and store contracts without a
//! server. Writes inside a transaction are staged on the handle and only
//! become visible to other readers on commit. Unique emails are reserved
//! at insert time, so two concurrent transactions inserting the same email
//! conflict immediately instead of at commit.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::provider::ConnectionProvider;
use crate::error::{ConnectionError, DomainError, DomainResult, TransactionError};
use crate::models::{NewUser, User, UserId};
use crate::transaction::TxBackend;

/// Transaction counters, for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    /// email → id of the transaction holding an uncommitted insert
    reserved: HashMap<String, u64>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    next_tx: AtomicU64,
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    closed: AtomicBool,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            Err(ConnectionError::Closed)
        } else {
            Ok(())
        }
    }

    /// Drop staged rows and release reservations held by `tx`.
    fn discard(&self, tx: &MemoryTransaction) {
        let mut state = self.state();
        state.reserved.retain(|_, holder| *holder != tx.id);
        tx.staged().clear();
        self.rolled_back.fetch_add(1, Ordering::AcqRel);
    }
}

/// Shared handle to an in-memory database. Clones share storage.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<Inner>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            begun: self.inner.begun.load(Ordering::Acquire),
            committed: self.inner.committed.load(Ordering::Acquire),
            rolled_back: self.inner.rolled_back.load(Ordering::Acquire),
        }
    }

    /// Number of committed user rows.
    pub fn user_count(&self) -> usize {
        self.inner.state().users.len()
    }

    /// Insert a user, staged on `tx` or committed immediately without one.
    pub(crate) fn insert_user(
        &self,
        tx: Option<&MemoryTransaction>,
        new_user: NewUser,
    ) -> DomainResult<UserId> {
        self.inner.ensure_open()?;
        if let Some(tx) = tx {
            tx.ensure_active()?;
        }

        let mut state = self.inner.state();
        let key = new_user.email.as_str().to_owned();

        let taken = state.users.iter().any(|u| u.email == new_user.email)
            || state.reserved.contains_key(&key);
        if taken {
            return Err(DomainError::Conflict {
                resource: "user",
                field: "email",
            });
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        let id = user.id;

        match tx {
            Some(tx) => {
                state.reserved.insert(key, tx.id);
                tx.staged().push(user);
            }
            None => state.users.push(user),
        }

        Ok(id)
    }

    /// First user matching `predicate`, reading `tx`'s own writes first.
    pub(crate) fn find_user(
        &self,
        tx: Option<&MemoryTransaction>,
        predicate: impl Fn(&User) -> bool,
    ) -> DomainResult<Option<User>> {
        self.inner.ensure_open()?;

        if let Some(tx) = tx {
            tx.ensure_active()?;
            if let Some(user) = tx.staged().iter().find(|u| predicate(u)) {
                return Ok(Some(user.clone()));
            }
        }

        let state = self.inner.state();
        Ok(state.users.iter().find(|u| predicate(u)).cloned())
    }
}

impl fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDatabase")
            .field("stats", &self.stats())
            .field("closed", &self.inner.closed.load(Ordering::Acquire))
            .finish()
    }
}

/// One in-flight in-memory transaction.
///
/// Rolls back on drop unless committed or rolled back explicitly.
pub struct MemoryTransaction {
    id: u64,
    db: Arc<Inner>,
    staged: Mutex<Vec<User>>,
    finished: AtomicBool,
}

impl MemoryTransaction {
    fn staged(&self) -> MutexGuard<'_, Vec<User>> {
        self.staged.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if self.finished.load(Ordering::Acquire) {
            Err(DomainError::internal("transaction is no longer active"))
        } else {
            Ok(())
        }
    }

    /// Mark finished; returns false if it already was.
    fn finish(&self) -> bool {
        !self.finished.swap(true, Ordering::AcqRel)
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.finish() {
            tracing::debug!(tx = self.id, "transaction dropped while active, rolling back");
            self.db.discard(self);
        }
    }
}

impl fmt::Debug for MemoryTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransaction")
            .field("id", &self.id)
            .field("staged", &self.staged().len())
            .finish()
    }
}

#[async_trait]
impl TxBackend for MemoryDatabase {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, TransactionError> {
        self.inner.ensure_open().map_err(TransactionError::begin)?;

        let id = self.inner.next_tx.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.begun.fetch_add(1, Ordering::AcqRel);

        Ok(MemoryTransaction {
            id,
            db: Arc::clone(&self.inner),
            staged: Mutex::new(Vec::new()),
            finished: AtomicBool::new(false),
        })
    }

    async fn commit(&self, tx: MemoryTransaction) -> Result<(), TransactionError> {
        // On failure `tx` is dropped here, which rolls it back.
        self.inner.ensure_open().map_err(TransactionError::commit)?;

        let mut state = self.inner.state();
        state.reserved.retain(|_, holder| *holder != tx.id);
        let staged = std::mem::take(&mut *tx.staged());
        state.users.extend(staged);
        drop(state);

        tx.finish();
        self.inner.committed.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTransaction) -> Result<(), TransactionError> {
        if tx.finish() {
            self.inner.discard(&tx);
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectionProvider for MemoryDatabase {
    async fn check_health(&self) -> Result<bool, ConnectionError> {
        Ok(!self.inner.closed.load(Ordering::Acquire))
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            tracing::info!("memory database closed");
        }
        Ok(())
    }
}
