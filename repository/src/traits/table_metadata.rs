//! Model mapping
//!
//! Maps a typed record onto its table, its columns and its primary key so the
//! repository can build INSERT/UPDATE column lists and WHERE-by-key clauses.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::Postgres;
use std::fmt::Debug;

/// Metadata about a record's table structure.
///
/// This trait should be derived:
/// ```ignore
/// use dbstore::prelude::*;
///
/// #[derive(Debug, Clone, sqlx::FromRow, TableMetadata)]
/// #[table(name = "books")]
/// pub struct Book {
///     #[primary_key]
///     pub id: String,
///     pub title: String,
/// }
/// ```
///
/// Manual implementations must keep [`columns`](Self::columns) and
/// [`bind_columns`](Self::bind_columns) in the same order.
pub trait TableMetadata:
    for<'r> sqlx::FromRow<'r, PgRow> + Send + Sync + Unpin + Sized
{
    /// The type used for the primary key
    type Id: Clone
        + Send
        + Sync
        + Debug
        + 'static
        + for<'q> sqlx::Encode<'q, Postgres>
        + sqlx::Type<Postgres>;

    /// The table name in the database
    fn table_name() -> &'static str;

    /// Every column of the table, primary key included, in binding order
    fn columns() -> &'static [&'static str];

    /// Get the primary key column name
    fn primary_key_field() -> &'static str;

    /// Extract the primary key value from a record
    fn extract_id(&self) -> Self::Id;

    /// Bind every column value of this record, in [`columns`](Self::columns) order
    fn bind_columns<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments>;

    /// Bind every column value except the primary key, in [`non_key_columns`](Self::non_key_columns) order
    fn bind_non_key_columns<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments>;

    /// Columns other than the primary key, used for UPDATE and upsert SET lists
    fn non_key_columns() -> Vec<&'static str> {
        Self::columns()
            .iter()
            .copied()
            .filter(|column| *column != Self::primary_key_field())
            .collect()
    }
}
