//! Embedded schema migrations
//!
//! Reversible: every `.up.sql` under `migrations/` has a matching
//! `.down.sql`.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use thiserror::Error;

use super::provider::{ConnectionProvider, Database, DbConfig};
use crate::error::ConnectionError;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Which way to move the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Apply every pending migration.
pub async fn up(pool: &PgPool) -> Result<(), MigrateError> {
    tracing::info!("applying migrations");
    MIGRATOR.run(pool).await?;
    tracing::info!("migrations applied");
    Ok(())
}

/// Revert every applied migration.
pub async fn down(pool: &PgPool) -> Result<(), MigrateError> {
    tracing::info!("reverting migrations");
    MIGRATOR.undo(pool, 0).await?;
    tracing::info!("migrations reverted");
    Ok(())
}

pub async fn apply(pool: &PgPool, direction: Direction) -> Result<(), MigrateError> {
    match direction {
        Direction::Up => up(pool).await,
        Direction::Down => down(pool).await,
    }
}

/// Connect, migrate in `direction`, then close the pool.
pub async fn run(config: &DbConfig, direction: Direction) -> Result<(), MigrationError> {
    let db = Database::connect(config).await?;
    let outcome = apply(db.pool(), direction).await;
    db.disconnect().await?;
    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_migration_is_reversible() {
        let ups = MIGRATOR
            .iter()
            .filter(|m| m.migration_type.is_up_migration())
            .count();
        let downs = MIGRATOR
            .iter()
            .filter(|m| m.migration_type.is_down_migration())
            .count();

        assert!(ups > 0);
        assert_eq!(ups, downs);
    }

    #[sqlx::test(migrator = "MIGRATOR")]
    #[ignore = "requires database"]
    async fn users_table_round_trips(pool: PgPool) {
        sqlx::query("SELECT id, name, email, password_hash FROM users LIMIT 0")
            .execute(&pool)
            .await
            .expect("users table missing after up");

        down(&pool).await.expect("down failed");

        let missing = sqlx::query("SELECT 1 FROM users LIMIT 0")
            .execute(&pool)
            .await;
        assert!(missing.is_err());
    }
}
