//! Stores - one per aggregate
//!
//! A store executes statements against whatever it was built with: the
//! base pool or a borrowed transaction. It never begins, commits or rolls
//! back. Services get a transaction-bound copy with [`BindUserStore::bind`].

mod memory;
mod users;

pub use memory::MemoryUserStore;
pub use users::SqlUserStore;

use async_trait::async_trait;

use crate::error::{DomainError, DomainResult};
use crate::models::{Email, NewUser, User, UserId};

/// Persistence of user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. A duplicate email is [`DomainError::Conflict`].
    async fn create(&self, user: NewUser) -> DomainResult<UserId>;

    /// [`DomainError::NotFound`] when no row matches.
    async fn find_by_email(&self, email: &Email) -> DomainResult<User>;

    async fn find_by_id(&self, id: UserId) -> DomainResult<User>;
}

/// A base-bound user store that can be rebound to a transaction handle.
///
/// The bound store borrows the handle, so it cannot outlive the unit of
/// work it was created in.
pub trait BindUserStore<Tx>: UserStore {
    type Bound<'t>: UserStore + 't
    where
        Self: 't,
        Tx: 't;

    fn bind<'t>(&'t self, tx: &'t Tx) -> Self::Bound<'t>;
}

/// Classify a backend error at the store boundary.
///
/// Unique violations become conflicts on `unique_field`, missing rows
/// become not-found, everything else is internal.
pub(crate) fn classify(
    err: sqlx::Error,
    resource: &'static str,
    unique_field: &'static str,
) -> DomainError {
    match err {
        sqlx::Error::RowNotFound => DomainError::NotFound { resource },
        sqlx::Error::Database(ref db) if db.is_unique_violation() => DomainError::Conflict {
            resource,
            field: unique_field,
        },
        other => {
            tracing::debug!(error = %other, resource, "unclassified store error");
            DomainError::internal(other)
        }
    }
}
