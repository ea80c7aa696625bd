//! Convenience re-exports for common dbstore usage
//!
//! This prelude module re-exports the most commonly used items from the dbstore crates,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use dbstore::prelude::*;
//!
//! let predicate = contains("title", "Rust");
//! assert!(predicate.is_some());
//! ```

// Core dbstore components
pub use crate::core::DbStore;
pub use crate::errors::StoreError;

// Re-export centralized config
pub use dbstore_config::{AppConfig, ConfigError, DatabaseConfig};

// Re-export commonly used repository types for convenience
pub use dbstore_repository::prelude::*;

// Re-export the repository crate for derive-generated code
pub use dbstore_repository;

// Re-export table derive for model creation
pub use dbstore_derive::{TableMetadata, model};

// Common external dependencies
pub use anyhow;
pub use sqlx;
pub use tokio;

// Commonly used sqlx types
pub use sqlx::{Postgres, Transaction};

// Types records commonly carry
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use uuid::Uuid;
