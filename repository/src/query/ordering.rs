//! Ordering and limits
//!
//! Direction strings are programmer input, not user input: anything other than
//! `asc`/`desc` (any case, surrounding whitespace ignored) panics instead of
//! being defaulted. A blank direction means "no ordering".

use super::select::SelectQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Parse a direction string. Blank input yields `None`.
    ///
    /// # Panics
    /// On any non-blank value other than `asc` or `desc`.
    pub fn parse(direction: &str) -> Option<SortOrder> {
        let direction = direction.trim();
        if direction.is_empty() {
            return None;
        }

        match direction.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => panic!(
                "invalid order direction {:?}: should be 'asc' or 'desc'",
                direction
            ),
        }
    }
}

/// Cap the number of returned rows; negative limits are treated as 0
pub fn limit(query: &mut SelectQuery, n: i64) {
    query.limit(n);
}

/// Order by `column` in `direction` ("asc"/"desc", case-insensitive; blank is a no-op)
///
/// # Panics
/// When `direction` is neither blank nor a valid direction.
pub fn order_by(query: &mut SelectQuery, column: &str, direction: &str) {
    query.order_by(column, direction);
}

pub fn order_by_asc(query: &mut SelectQuery, column: &str) {
    query.order_by_sort(column, SortOrder::Asc);
}

pub fn order_by_desc(query: &mut SelectQuery, column: &str) {
    query.order_by_sort(column, SortOrder::Desc);
}
