//! User store over the in-memory backend

use async_trait::async_trait;

use super::{BindUserStore, UserStore};
use crate::db::{MemoryDatabase, MemoryTransaction};
use crate::error::{DomainError, DomainResult};
use crate::models::{Email, NewUser, User, UserId};

/// User store bound to the memory database, optionally inside a transaction.
#[derive(Debug, Clone)]
pub struct MemoryUserStore<'t> {
    db: MemoryDatabase,
    tx: Option<&'t MemoryTransaction>,
}

impl MemoryUserStore<'static> {
    pub fn new(db: MemoryDatabase) -> Self {
        Self { db, tx: None }
    }
}

impl MemoryUserStore<'_> {
    pub fn is_transactional(&self) -> bool {
        self.tx.is_some()
    }

    fn found(user: Option<User>) -> DomainResult<User> {
        user.ok_or(DomainError::NotFound { resource: "user" })
    }
}

#[async_trait]
impl<'t> UserStore for MemoryUserStore<'t> {
    async fn create(&self, user: NewUser) -> DomainResult<UserId> {
        self.db.insert_user(self.tx, user)
    }

    async fn find_by_email(&self, email: &Email) -> DomainResult<User> {
        Self::found(self.db.find_user(self.tx, |u| &u.email == email)?)
    }

    async fn find_by_id(&self, id: UserId) -> DomainResult<User> {
        Self::found(self.db.find_user(self.tx, |u| u.id == id)?)
    }
}

impl BindUserStore<MemoryTransaction> for MemoryUserStore<'static> {
    type Bound<'t> = MemoryUserStore<'t>;

    fn bind<'t>(&'t self, tx: &'t MemoryTransaction) -> Self::Bound<'t> {
        MemoryUserStore {
            db: self.db.clone(),
            tx: Some(tx),
        }
    }
}
