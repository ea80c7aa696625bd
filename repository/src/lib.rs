//! Repository - Core data-access layer for dbstore
//!
//! This crate provides the predicate builder and the statement builders that
//! predicates are composed into, with typed [`SqlValue`] parameters. On top
//! of them sit keyset pagination and the generic [`Repository`] running CRUD
//! and transactional operations over any [`TableMetadata`] record.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub mod errors;
pub mod filter;
pub mod pagination;
pub mod prelude;
pub mod query;
pub mod repository;
pub mod traits;
pub mod value;

pub use errors::DbStoreError;
pub use filter::{BoundValue, ComparisonShape, Predicate};
pub use pagination::{paginate, PageDirection, PaginationParams};
pub use query::{Combinator, DeleteQuery, Filterable, SelectQuery, SortOrder, UpdateQuery};
pub use repository::{Repository, TxHandle};
pub use traits::TableMetadata;
pub use value::SqlValue;

// Generated model code reaches sqlx through this path.
pub use sqlx;
