use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbStoreError {
    /// Errors reported by the store, passed through untouched.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Statement timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transaction already committed or rolled back")]
    TransactionClosed,
}

impl DbStoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// The underlying store error, if this error came from the store
    pub fn as_database(&self) -> Option<&sqlx::Error> {
        match self {
            DbStoreError::Database(e) => Some(e),
            _ => None,
        }
    }

    /// True when the store rejected a write because of a primary-key or unique constraint
    pub fn is_unique_violation(&self) -> bool {
        match self.as_database() {
            Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// True when a single-row lookup found nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self.as_database(), Some(sqlx::Error::RowNotFound))
    }
}
