//! Convenience re-exports for common repository usage

// Core traits
pub use crate::query::Filterable;
pub use crate::traits::TableMetadata;

// Error types
pub use crate::errors::DbStoreError;

// Statement parameters
pub use crate::value::SqlValue;

// Predicate constructors
pub use crate::filter::*;

// Statement builders
pub use crate::query::{
    apply_predicate, limit, order_by, order_by_asc, order_by_desc, Combinator, DeleteQuery,
    SelectQuery, SortOrder, UpdateQuery,
};

// Pagination
pub use crate::pagination::{paginate, PageDirection, PaginationParams};

// Repository
pub use crate::repository::{Repository, TxHandle};

// Common external dependencies that are frequently used
pub use serde_json::{json, Value};
pub use sqlx::{FromRow, PgPool};
