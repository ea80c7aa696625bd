//! Predicate constructors
//!
//! One function per operator. Each returns `None` instead of a predicate when
//! its input is degenerate, so optional filters can be chained without
//! checking them first:
//!
//! ```ignore
//! query
//!     .filter(eq("status", form.status))          // Option<String>, skipped when None
//!     .filter(contains("name", &form.search))     // skipped when blank
//!     .filter(in_values("id", form.ids));         // skipped when empty
//! ```

use super::{BoundValue, ComparisonShape, Predicate};
use crate::value::SqlValue;

// Short aliases
pub use self::equal as eq;
pub use self::ends_with as ends;
pub use self::greater_than as gt;
pub use self::greater_than_or_equal as gte;
pub use self::less_than as lt;
pub use self::less_than_or_equal as lte;
pub use self::not_ends_with as not_ends;
pub use self::not_equal as neq;
pub use self::not_starts_with as not_starts;
pub use self::starts_with as starts;

fn comparison(shape: ComparisonShape, column: &str, value: SqlValue) -> Option<Predicate> {
    if blank(column) || value.is_null() {
        return None;
    }
    Some(Predicate::new(shape, column, BoundValue::Single(value)))
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn pattern(shape: ComparisonShape, column: &str, value: &str, pattern: String) -> Option<Predicate> {
    if blank(column) || blank(value) {
        return None;
    }
    Some(Predicate::new(shape, column, BoundValue::Single(SqlValue::Text(pattern))).lowercased())
}

fn membership<T, I>(shape: ComparisonShape, column: &str, values: I) -> Option<Predicate>
where
    T: Into<SqlValue>,
    I: IntoIterator<Item = T>,
{
    if blank(column) {
        return None;
    }
    let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return None;
    }
    Some(Predicate::new(shape, column, BoundValue::List(values)))
}

/// `column = value`; `None` when the value is null
pub fn equal(column: &str, value: impl Into<SqlValue>) -> Option<Predicate> {
    comparison(ComparisonShape::Eq, column, value.into())
}

/// `column != value`; `None` when the value is null
pub fn not_equal(column: &str, value: impl Into<SqlValue>) -> Option<Predicate> {
    comparison(ComparisonShape::NotEq, column, value.into())
}

/// `column < value`; `None` when the value is null
pub fn less_than(column: &str, value: impl Into<SqlValue>) -> Option<Predicate> {
    comparison(ComparisonShape::Lt, column, value.into())
}

/// `column <= value`; `None` when the value is null
pub fn less_than_or_equal(column: &str, value: impl Into<SqlValue>) -> Option<Predicate> {
    comparison(ComparisonShape::Lte, column, value.into())
}

/// `column > value`; `None` when the value is null
pub fn greater_than(column: &str, value: impl Into<SqlValue>) -> Option<Predicate> {
    comparison(ComparisonShape::Gt, column, value.into())
}

/// `column >= value`; `None` when the value is null
pub fn greater_than_or_equal(column: &str, value: impl Into<SqlValue>) -> Option<Predicate> {
    comparison(ComparisonShape::Gte, column, value.into())
}

/// `lower(column) LIKE '%value%'`; `None` when the value is blank.
///
/// Only the column is lower-cased. The value is matched as given, so callers
/// wanting case-insensitive matches must pass it lower-cased.
pub fn contains(column: &str, value: &str) -> Option<Predicate> {
    pattern(ComparisonShape::Like, column, value, format!("%{}%", value))
}

/// `lower(column) NOT LIKE '%value%'`; `None` when the value is blank
pub fn not_contains(column: &str, value: &str) -> Option<Predicate> {
    pattern(ComparisonShape::NotLike, column, value, format!("%{}%", value))
}

/// `lower(column) LIKE 'value%'`; `None` when the value is blank
pub fn starts_with(column: &str, value: &str) -> Option<Predicate> {
    pattern(ComparisonShape::Like, column, value, format!("{}%", value))
}

/// `lower(column) NOT LIKE 'value%'`; `None` when the value is blank
pub fn not_starts_with(column: &str, value: &str) -> Option<Predicate> {
    pattern(ComparisonShape::NotLike, column, value, format!("{}%", value))
}

/// `lower(column) LIKE '%value'`; `None` when the value is blank
pub fn ends_with(column: &str, value: &str) -> Option<Predicate> {
    pattern(ComparisonShape::Like, column, value, format!("%{}", value))
}

/// `lower(column) NOT LIKE '%value'`; `None` when the value is blank
pub fn not_ends_with(column: &str, value: &str) -> Option<Predicate> {
    pattern(ComparisonShape::NotLike, column, value, format!("%{}", value))
}

/// `column IN (v1, v2, ...)`; `None` when there are no values
pub fn in_values<T, I>(column: &str, values: I) -> Option<Predicate>
where
    T: Into<SqlValue>,
    I: IntoIterator<Item = T>,
{
    membership(ComparisonShape::In, column, values)
}

/// `column NOT IN (v1, v2, ...)`; `None` when there are no values
pub fn not_in_values<T, I>(column: &str, values: I) -> Option<Predicate>
where
    T: Into<SqlValue>,
    I: IntoIterator<Item = T>,
{
    membership(ComparisonShape::NotIn, column, values)
}

/// `column IS NULL`; `None` only when the column is blank
pub fn is_null(column: &str) -> Option<Predicate> {
    if blank(column) {
        return None;
    }
    Some(Predicate::new(ComparisonShape::IsNull, column, BoundValue::None))
}

/// `column IS NOT NULL`; `None` only when the column is blank
pub fn is_not_null(column: &str) -> Option<Predicate> {
    if blank(column) {
        return None;
    }
    Some(Predicate::new(ComparisonShape::IsNotNull, column, BoundValue::None))
}
