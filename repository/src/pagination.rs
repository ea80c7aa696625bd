//! Keyset (cursor) pagination
//!
//! A page is the rows ordered on a cursor column, starting at the cursor value
//! and capped at `limit`. The boundary is inclusive: asking for the next page
//! with the last seen row's cursor returns that row again as the first element,
//! so callers either advance past it or drop it client-side.

use crate::errors::DbStoreError;
use crate::filter::{greater_than_or_equal, less_than_or_equal};
use crate::query::{Filterable, SelectQuery, SortOrder};
use crate::value::SqlValue;

/// Which way a page walks the cursor column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    /// Ascending from the cursor (`column >= cursor`)
    NextPage,
    /// Descending from the cursor (`column <= cursor`)
    PreviousPage,
}

/// Pagination configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationParams {
    limit: i64,
    direction: PageDirection,
    cursor_column: String,
    cursor_value: Option<SqlValue>,
}

impl PaginationParams {
    /// Negative limits are floored at 0. Fails when `cursor_column` is blank.
    pub fn new(
        limit: i64,
        direction: PageDirection,
        cursor_column: &str,
        cursor_value: Option<SqlValue>,
    ) -> Result<Self, DbStoreError> {
        if cursor_column.trim().is_empty() {
            return Err(DbStoreError::configuration(
                "cursor column not specified: must be specified",
            ));
        }

        Ok(Self {
            limit: limit.max(0),
            direction,
            cursor_column: cursor_column.to_string(),
            cursor_value,
        })
    }

    /// First page walking forward (no cursor yet)
    pub fn first(limit: i64, cursor_column: &str) -> Result<Self, DbStoreError> {
        Self::new(limit, PageDirection::NextPage, cursor_column, None)
    }

    /// Page forward starting at `cursor`
    pub fn next_page(
        limit: i64,
        cursor_column: &str,
        cursor: impl Into<SqlValue>,
    ) -> Result<Self, DbStoreError> {
        Self::new(limit, PageDirection::NextPage, cursor_column, Some(cursor.into()))
    }

    /// Page backward starting at `cursor`
    pub fn previous_page(
        limit: i64,
        cursor_column: &str,
        cursor: impl Into<SqlValue>,
    ) -> Result<Self, DbStoreError> {
        Self::new(limit, PageDirection::PreviousPage, cursor_column, Some(cursor.into()))
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn direction(&self) -> PageDirection {
        self.direction
    }

    pub fn cursor_column(&self) -> &str {
        &self.cursor_column
    }

    pub fn cursor_value(&self) -> Option<&SqlValue> {
        self.cursor_value.as_ref()
    }

    /// The cursor, unless it is absent, null or a blank string
    fn boundary(&self) -> Option<&SqlValue> {
        match &self.cursor_value {
            None | Some(SqlValue::Null) => None,
            Some(SqlValue::Text(s)) if s.trim().is_empty() => None,
            Some(value) => Some(value),
        }
    }
}

/// Apply ordering, limit and the inclusive cursor boundary to a select.
///
/// The cursor value is opaque here: no check is made that it matches the
/// column's type. It binds as the type it was built from, so a numeric
/// column needs a numeric cursor and a text column a text one.
pub fn paginate(query: &mut SelectQuery, params: &PaginationParams) -> Result<(), DbStoreError> {
    if params.cursor_column.trim().is_empty() {
        return Err(DbStoreError::configuration(
            "cursor column not specified: must be specified",
        ));
    }

    let column = params.cursor_column.as_str();
    let boundary = params.boundary().cloned();

    match params.direction {
        PageDirection::NextPage => {
            query.order_by_sort(column, SortOrder::Asc);
            if let Some(cursor) = boundary {
                query.filter(greater_than_or_equal(column, cursor));
            }
        }
        PageDirection::PreviousPage => {
            query.order_by_sort(column, SortOrder::Desc);
            if let Some(cursor) = boundary {
                query.filter(less_than_or_equal(column, cursor));
            }
        }
    }
    query.limit(params.limit);

    crate::debug_log!(
        "[PAGINATE] column={} direction={:?} limit={}",
        column,
        params.direction,
        params.limit
    );

    Ok(())
}
