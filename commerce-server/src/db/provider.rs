//! Database connection provider
//!
//! Uses sqlx PgPool with explicit connection limits and bounded timeouts.
//! The provider is the sole owner of the pool: it is created once at
//! startup and closed once at shutdown.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::ConnectionError;

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default bound on connecting and on acquiring a pooled connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Health probe and graceful close, independent of the backing store.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Issue a lightweight probe. `Ok(false)` means the provider was closed.
    async fn check_health(&self) -> Result<bool, ConnectionError>;

    /// Close the underlying resources. Safe to call more than once.
    async fn disconnect(&self) -> Result<(), ConnectionError>;
}

/// Connection settings for the relational store
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// PostgreSQL connection provider.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    probe_timeout: Duration,
}

impl Database {
    /// Create the pool and open the first connection.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::TimedOut`] if the server does not answer
    /// within `connect_timeout`, [`ConnectionError::Connect`] otherwise.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let db = Database::connect(&DbConfig::new("postgres://localhost/commerce")).await?;
    /// ```
    pub async fn connect(config: &DbConfig) -> Result<Self, ConnectionError> {
        let connecting = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.url);

        let pool = tokio::time::timeout(config.connect_timeout, connecting)
            .await
            .map_err(|_| ConnectionError::TimedOut(config.connect_timeout))?
            .map_err(ConnectionError::Connect)?;

        tracing::debug!(max_connections = config.max_connections, "database pool created");

        Ok(Self {
            pool,
            probe_timeout: config.connect_timeout,
        })
    }

    /// Wrap an existing pool (tests, tooling).
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            probe_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ConnectionProvider for Database {
    async fn check_health(&self) -> Result<bool, ConnectionError> {
        if self.pool.is_closed() {
            return Ok(false);
        }

        tokio::time::timeout(
            self.probe_timeout,
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await
        .map_err(|_| ConnectionError::TimedOut(self.probe_timeout))?
        .map_err(ConnectionError::Unhealthy)?;

        Ok(true)
    }

    async fn disconnect(&self) -> Result<(), ConnectionError> {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("database pool closed");
        }
        Ok(())
    }
}
