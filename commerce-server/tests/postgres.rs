//! End-to-end checks against PostgreSQL
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p commerce-server -- --ignored

use std::sync::Arc;

use commerce_server::crypto::{Bcrypt, MIN_COST};
use commerce_server::db::{Database, PoolExecutor};
use commerce_server::models::{Email, LoginInput, NewUser, RegisterInput};
use commerce_server::service::AuthService;
use commerce_server::store::{BindUserStore, SqlUserStore, UserStore};
use commerce_server::transaction::TransactionManager;
use commerce_server::DomainError;
use sqlx::PgPool;

type PgService = AuthService<Database, SqlUserStore<PoolExecutor>, Bcrypt>;

fn service(db: &Database) -> PgService {
    AuthService::new(
        TransactionManager::new(db.clone()),
        SqlUserStore::new(PoolExecutor::from(db)),
        Arc::new(Bcrypt::new(MIN_COST).unwrap()),
    )
}

async fn user_rows(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrator = "commerce_server::db::migrations::MIGRATOR")]
#[ignore = "requires database"]
async fn register_login_and_conflict(pool: PgPool) {
    let db = Database::from_pool(pool.clone());
    let auth = service(&db);

    let input = || RegisterInput {
        name: "Edsger Dijkstra".into(),
        email: "edsger@example.com".into(),
        password: "goto-considered-harmful".into(),
    };

    let profile = auth.register(input()).await.expect("register failed");
    assert_eq!(profile.email, "edsger@example.com");

    let err = auth.register(input()).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict { field: "email", .. }));
    assert_eq!(user_rows(&pool).await, 1);

    let identity = auth
        .login(LoginInput {
            email: "EDSGER@example.com".into(),
            password: "goto-considered-harmful".into(),
        })
        .await
        .expect("login failed");
    assert_eq!(identity.user.id, profile.id);
}

#[sqlx::test(migrator = "commerce_server::db::migrations::MIGRATOR")]
#[ignore = "requires database"]
async fn failed_unit_of_work_is_rolled_back(pool: PgPool) {
    let db = Database::from_pool(pool.clone());
    let manager = TransactionManager::new(db.clone());
    let users = SqlUserStore::new(PoolExecutor::from(&db));

    let store = users.clone();
    let err = manager
        .run_in_transaction(move |tx| {
            Box::pin(async move {
                let bound = store.bind(tx);
                let id = bound
                    .create(NewUser {
                        name: "Tony Hoare".into(),
                        email: Email::parse("tony@example.com").unwrap(),
                        password_hash: "x".into(),
                    })
                    .await?;
                // visible inside its own transaction
                bound.find_by_id(id).await?;
                Err::<(), _>(DomainError::Unauthorized)
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Unauthorized));
    assert_eq!(user_rows(&pool).await, 0);
    assert!(matches!(
        users
            .find_by_email(&Email::parse("tony@example.com").unwrap())
            .await,
        Err(DomainError::NotFound { .. })
    ));
}
