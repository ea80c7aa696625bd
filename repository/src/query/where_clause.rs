//! WHERE clause accumulation
//!
//! Predicates are joined strictly in the order they are applied, each one by
//! its own combinator, with no parentheses added. `a AND b OR c` therefore
//! evaluates as SQL does: `(a AND b) OR c`. Group sub-expressions yourself with
//! [`Filterable::where_raw`] when a different grouping is needed.

use crate::filter::Predicate;
use crate::value::SqlValue;

/// Logical operator joining a condition to the ones applied before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// Ordered list of conditions with their `?`-placeholder parameters
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    conditions: Vec<(Combinator, String)>,
    params: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, combinator: Combinator, sql: String, params: Vec<SqlValue>) {
        self.conditions.push((combinator, sql));
        self.params.extend(params);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Conditions joined left to right, still using `?` placeholders.
    /// The first condition's combinator is not rendered.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for (i, (combinator, condition)) in self.conditions.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(combinator.to_sql());
                sql.push(' ');
            }
            sql.push_str(condition);
        }
        sql
    }
}

/// Statements that accept predicate applications: SELECT, UPDATE and DELETE
pub trait Filterable {
    fn where_clause(&self) -> &WhereClause;

    fn where_clause_mut(&mut self) -> &mut WhereClause;

    /// Join a predicate with the given combinator. `None` is skipped.
    fn apply(&mut self, predicate: impl Into<Option<Predicate>>, combinator: Combinator) -> &mut Self
    where
        Self: Sized,
    {
        if let Some(predicate) = predicate.into() {
            let (sql, params) = predicate.to_clause();
            self.where_clause_mut().push(combinator, sql, params);
        }
        self
    }

    /// AND a predicate onto the conditions; `None` is skipped
    fn filter(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self
    where
        Self: Sized,
    {
        self.apply(predicate, Combinator::And)
    }

    /// OR a predicate onto the conditions; `None` is skipped
    fn or_filter(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self
    where
        Self: Sized,
    {
        self.apply(predicate, Combinator::Or)
    }

    /// AND a hand-written condition using `?` placeholders, e.g.
    /// `("(\"a\" = ? OR \"b\" = ?)", vec![1.into(), 2.into()])`
    fn where_raw(&mut self, sql: &str, params: Vec<SqlValue>) -> &mut Self
    where
        Self: Sized,
    {
        self.where_clause_mut()
            .push(Combinator::And, sql.to_string(), params);
        self
    }

    /// OR a hand-written condition using `?` placeholders
    fn or_where_raw(&mut self, sql: &str, params: Vec<SqlValue>) -> &mut Self
    where
        Self: Sized,
    {
        self.where_clause_mut()
            .push(Combinator::Or, sql.to_string(), params);
        self
    }
}

/// Apply a predicate to any statement target
pub fn apply_predicate<Q: Filterable>(
    target: &mut Q,
    predicate: impl Into<Option<Predicate>>,
    combinator: Combinator,
) {
    target.apply(predicate, combinator);
}
