//! User store over sqlx
//!
//! Written once against [`Executor`]: the same statements run on the pool
//! or inside a transaction depending only on the executor it holds.
//! Uniqueness is enforced by the `users_email_key` constraint and
//! classified on failure, never checked before inserting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::{classify, BindUserStore, UserStore};
use crate::db::{Executor, ExecutorKind, PgTransaction, PoolExecutor, TxExecutor};
use crate::error::{DomainError, DomainResult};
use crate::models::{Email, NewUser, User, UserId};

const RESOURCE: &str = "user";

const INSERT_USER: &str = r#"
    INSERT INTO users (name, email, password_hash)
    VALUES ($1, $2, $3)
    RETURNING id
"#;

const SELECT_BY_EMAIL: &str = r#"
    SELECT id, name, email, password_hash, created_at, updated_at
    FROM users
    WHERE email = $1
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, name, email, password_hash, created_at, updated_at
    FROM users
    WHERE id = $1
"#;

/// Row shape of the `users` table
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            name: row.name,
            email: Email::from_stored(row.email),
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// User store bound to an executor.
#[derive(Debug, Clone)]
pub struct SqlUserStore<E> {
    executor: E,
}

impl<E: Executor> SqlUserStore<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Same statements, different executor.
    pub fn rebind<F: Executor>(&self, executor: F) -> SqlUserStore<F> {
        SqlUserStore { executor }
    }

    pub fn executor_kind(&self) -> ExecutorKind {
        self.executor.kind()
    }

    async fn find_one(&self, query: crate::db::PgQuery<'_>) -> DomainResult<User> {
        let row = self
            .executor
            .fetch_optional(query)
            .await
            .map_err(|e| classify(e, RESOURCE, "email"))?
            .ok_or(DomainError::NotFound { resource: RESOURCE })?;

        let row = UserRow::from_row(&row).map_err(|e| classify(e, RESOURCE, "email"))?;
        Ok(row.into())
    }
}

#[async_trait]
impl<E: Executor> UserStore for SqlUserStore<E> {
    async fn create(&self, user: NewUser) -> DomainResult<UserId> {
        let query = sqlx::query(INSERT_USER)
            .bind(user.name)
            .bind(user.email.as_str().to_owned())
            .bind(user.password_hash);

        let row = self
            .executor
            .fetch_one(query)
            .await
            .map_err(|e| classify(e, RESOURCE, "email"))?;

        let id: Uuid = row
            .try_get("id")
            .map_err(|e| classify(e, RESOURCE, "email"))?;

        tracing::debug!(user_id = %id, executor = ?self.executor.kind(), "user inserted");
        Ok(UserId(id))
    }

    async fn find_by_email(&self, email: &Email) -> DomainResult<User> {
        let query = sqlx::query(SELECT_BY_EMAIL).bind(email.as_str().to_owned());
        self.find_one(query).await
    }

    async fn find_by_id(&self, id: UserId) -> DomainResult<User> {
        let query = sqlx::query(SELECT_BY_ID).bind(id.0);
        self.find_one(query).await
    }
}

impl BindUserStore<PgTransaction> for SqlUserStore<PoolExecutor> {
    type Bound<'t> = SqlUserStore<TxExecutor<'t>>;

    fn bind<'t>(&'t self, tx: &'t PgTransaction) -> Self::Bound<'t> {
        self.rebind(TxExecutor::new(tx))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use sqlx::postgres::{PgQueryResult, PgRow};
    use sqlx::Execute;

    use super::*;
    use crate::db::PgQuery;

    /// Records statement text and fails every call.
    #[derive(Debug, Clone)]
    struct RecordingExecutor {
        kind: ExecutorKind,
        statements: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingExecutor {
        fn new(kind: ExecutorKind) -> Self {
            Self {
                kind,
                statements: Arc::default(),
            }
        }

        fn record(&self, query: &PgQuery<'_>) {
            self.statements.lock().unwrap().push(query.sql().to_owned());
        }

        fn statements(&self) -> Vec<String> {
            self.statements.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Executor for RecordingExecutor {
        fn kind(&self) -> ExecutorKind {
            self.kind
        }

        async fn execute<'q>(&self, query: PgQuery<'q>) -> Result<PgQueryResult, sqlx::Error> {
            self.record(&query);
            Err(sqlx::Error::PoolClosed)
        }

        async fn fetch_one<'q>(&self, query: PgQuery<'q>) -> Result<PgRow, sqlx::Error> {
            self.record(&query);
            Err(sqlx::Error::PoolClosed)
        }

        async fn fetch_optional<'q>(&self, query: PgQuery<'q>) -> Result<Option<PgRow>, sqlx::Error> {
            self.record(&query);
            Ok(None)
        }
    }

    fn new_user() -> NewUser {
        NewUser {
            name: "Ada".into(),
            email: Email::parse("ada@example.com").unwrap(),
            password_hash: "$2b$04$hash".into(),
        }
    }

    async fn exercise(store: &impl UserStore) {
        let email = Email::parse("ada@example.com").unwrap();

        let created = store.create(new_user()).await;
        assert!(matches!(created, Err(DomainError::Internal(_))));

        let by_email = store.find_by_email(&email).await;
        assert!(matches!(by_email, Err(DomainError::NotFound { resource: "user" })));

        let by_id = store.find_by_id(UserId::new()).await;
        assert!(matches!(by_id, Err(DomainError::NotFound { resource: "user" })));
    }

    #[tokio::test]
    async fn rebound_store_issues_identical_statements() {
        let pool_exec = RecordingExecutor::new(ExecutorKind::Pool);
        let tx_exec = RecordingExecutor::new(ExecutorKind::Transaction);

        let base = SqlUserStore::new(pool_exec.clone());
        let bound = base.rebind(tx_exec.clone());

        assert_eq!(base.executor_kind(), ExecutorKind::Pool);
        assert_eq!(bound.executor_kind(), ExecutorKind::Transaction);

        exercise(&base).await;
        exercise(&bound).await;

        assert_eq!(pool_exec.statements().len(), 3);
        assert_eq!(pool_exec.statements(), tx_exec.statements());
    }

    #[tokio::test]
    async fn missing_row_is_not_found_not_default_user() {
        let store = SqlUserStore::new(RecordingExecutor::new(ExecutorKind::Pool));
        let err = store
            .find_by_email(&Email::parse("nobody@example.com").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
