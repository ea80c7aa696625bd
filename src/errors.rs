//! Error types for the dbstore crate
//!
//! This module contains the top-level error returned by `DbStore` setup and
//! conversions from the repository and configuration errors.

use dbstore_config::ConfigError;
use dbstore_repository::DbStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] DbStoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
