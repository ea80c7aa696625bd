//! Core dbstore functionality
//!
//! This module contains the `DbStore` entry point: it owns the connection
//! pool built from configuration and hands out repositories over it.

use dbstore_config::DatabaseConfig;
use dbstore_repository::Repository;
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::StoreError;

/// Owns the connection pool and the statement timeout applied to repositories
#[derive(Debug, Clone)]
pub struct DbStore {
    pool: PgPool,
    statement_timeout: Option<Duration>,
}

impl DbStore {
    /// Create new DbStore with database connection
    pub async fn new(config: DatabaseConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let mut connect_options = PgConnectOptions::from_str(&config.connection_string())?;

        // Server-side default so statements issued straight on the pool are bounded too
        if let Some(ms) = config.statement_timeout_ms {
            connect_options =
                connect_options.options([("statement_timeout", ms.to_string())]);
        }

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        let pool = pool_options.connect_with(connect_options).await?;
        tracing::debug!(
            host = %config.host,
            database = %config.database,
            max_connections = config.max_connections,
            "connection pool ready"
        );

        Ok(Self {
            pool,
            statement_timeout: config.statement_timeout(),
        })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: None,
        }
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Repository over the pool, carrying the configured statement timeout
    pub fn repository(&self) -> Repository {
        let repository = Repository::new(self.pool.clone());
        match self.statement_timeout {
            Some(timeout) => repository.with_timeout(timeout),
            None => repository,
        }
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
