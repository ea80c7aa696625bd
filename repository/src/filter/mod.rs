//! Predicate building
//!
//! A [`Predicate`] is one filter condition (operator, column, optional value)
//! that is not yet attached to a statement. The constructors in
//! [`operators`] never fail: input that cannot form a meaningful condition
//! (a blank column, a null value, blank text or an empty list) yields `None`,
//! which every statement builder silently skips.

pub mod operators;


pub use operators::*;

use crate::query::quote_ident;
use crate::value::SqlValue;

/// Comparison performed by a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonShape {
    Eq,        // =
    NotEq,     // !=
    Lt,        // <
    Lte,       // <=
    Gt,        // >
    Gte,       // >=
    Like,      // LIKE
    NotLike,   // NOT LIKE
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

impl ComparisonShape {
    pub fn to_sql(&self) -> &'static str {
        match self {
            ComparisonShape::Eq => "=",
            ComparisonShape::NotEq => "!=",
            ComparisonShape::Lt => "<",
            ComparisonShape::Lte => "<=",
            ComparisonShape::Gt => ">",
            ComparisonShape::Gte => ">=",
            ComparisonShape::Like => "LIKE",
            ComparisonShape::NotLike => "NOT LIKE",
            ComparisonShape::In => "IN",
            ComparisonShape::NotIn => "NOT IN",
            ComparisonShape::IsNull => "IS NULL",
            ComparisonShape::IsNotNull => "IS NOT NULL",
        }
    }
}

/// Value bound to a predicate's placeholder(s)
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Null tests carry no value
    None,
    Single(SqlValue),
    /// Set membership, one placeholder per element
    List(Vec<SqlValue>),
}

/// Single semantic filter condition
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    shape: ComparisonShape,
    column: String,
    value: BoundValue,
    lower_column: bool,
}

impl Predicate {
    pub(crate) fn new(shape: ComparisonShape, column: &str, value: BoundValue) -> Self {
        Self {
            shape,
            column: column.to_string(),
            value,
            lower_column: false,
        }
    }

    /// Wrap the column in `lower(...)` when rendered
    pub(crate) fn lowercased(mut self) -> Self {
        self.lower_column = true;
        self
    }

    pub fn shape(&self) -> ComparisonShape {
        self.shape
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &BoundValue {
        &self.value
    }

    /// True for `IS NULL` / `IS NOT NULL`, which render without a placeholder
    pub fn is_null_test(&self) -> bool {
        matches!(
            self.shape,
            ComparisonShape::IsNull | ComparisonShape::IsNotNull
        )
    }

    pub fn lowers_column(&self) -> bool {
        self.lower_column
    }

    /// Render as a SQL fragment with `?` placeholders and the values they bind
    pub fn to_clause(&self) -> (String, Vec<SqlValue>) {
        let mut column = quote_ident(&self.column);
        if self.lower_column {
            column = format!("lower({})", column);
        }
        let operator = self.shape.to_sql();

        if self.is_null_test() {
            return (format!("{} {}", column, operator), Vec::new());
        }

        match &self.value {
            BoundValue::Single(value) => (format!("{} {} ?", column, operator), vec![value.clone()]),
            BoundValue::List(values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                (
                    format!("{} {} ({})", column, operator, placeholders),
                    values.clone(),
                )
            }
            // Unreachable through the public constructors
            BoundValue::None => (format!("{} {} NULL", column, operator), Vec::new()),
        }
    }
}
