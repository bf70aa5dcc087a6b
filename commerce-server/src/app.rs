//! Composition root
//!
//! Builds the object graph leaf to root: provider, transaction manager,
//! store, hasher, service, HTTP state. Capabilities are passed by trait.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{AppConfig, DatabaseBackend};
use crate::crypto::Bcrypt;
use crate::db::{ConnectionProvider, Database, MemoryDatabase, PoolExecutor};
use crate::http::AppState;
use crate::service::AuthService;
use crate::store::{MemoryUserStore, SqlUserStore};
use crate::transaction::{TransactionManager, TxBackend};

/// Connect to the configured backend and assemble the HTTP state.
///
/// Fails fast when the database does not answer its first health probe.
pub async fn build(config: &AppConfig) -> Result<AppState> {
    let hasher = Arc::new(Bcrypt::new(config.bcrypt_cost).context("invalid bcrypt cost")?);

    let state = match config.database_backend {
        DatabaseBackend::Postgres => {
            tracing::info!("database backend: postgres");
            let db = Database::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            ensure_healthy(&db).await?;

            let users = SqlUserStore::new(PoolExecutor::from(&db));
            let transactions = manager(db.clone(), config);
            let auth = AuthService::new(transactions, users, hasher);

            AppState::new(Arc::new(auth), Arc::new(db), config.server.handler_timeout)
        }
        DatabaseBackend::Memory => {
            tracing::info!("database backend: memory");
            let db = MemoryDatabase::new();

            let users = MemoryUserStore::new(db.clone());
            let transactions = manager(db.clone(), config);
            let auth = AuthService::new(transactions, users, hasher);

            AppState::new(Arc::new(auth), Arc::new(db), config.server.handler_timeout)
        }
    };

    Ok(state)
}

fn manager<B: TxBackend>(backend: B, config: &AppConfig) -> TransactionManager<B> {
    let manager = TransactionManager::new(backend);
    match config.tx_timeout {
        Some(deadline) => manager.with_deadline(deadline),
        None => manager,
    }
}

async fn ensure_healthy(provider: &dyn ConnectionProvider) -> Result<()> {
    let healthy = provider
        .check_health()
        .await
        .context("database health check failed")?;
    anyhow::ensure!(healthy, "database reported unhealthy");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegisterInput;

    fn memory_config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "DATABASE_BACKEND" => Some("memory".into()),
            "BCRYPT_COST" => Some("4".into()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn memory_backend_builds_a_working_graph() {
        let state = build(&memory_config()).await.unwrap();

        assert!(state.provider.check_health().await.unwrap());

        let profile = state
            .auth
            .register(RegisterInput {
                name: "Linus".into(),
                email: "linus@example.com".into(),
                password: "penguins!".into(),
            })
            .await
            .unwrap();
        assert_eq!(profile.email, "linus@example.com");
    }
}
