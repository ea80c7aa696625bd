//! Statement builders
//!
//! This module provides the SELECT / UPDATE / DELETE builders that predicates
//! are applied to, and the rendering of `?` placeholders into PostgreSQL's
//! positional `$n` parameters.

pub mod delete;
pub mod ordering;
pub mod select;
pub mod update;
pub mod where_clause;


pub use delete::DeleteQuery;
pub use ordering::{limit, order_by, order_by_asc, order_by_desc, SortOrder};
pub use select::SelectQuery;
pub use update::UpdateQuery;
pub use where_clause::{apply_predicate, Combinator, Filterable, WhereClause};

/// Quote an identifier so it can never break out of its position in the statement
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Replace `?` placeholders with `$n`, numbering from `first`.
///
/// Question marks inside quoted identifiers or string literals are left alone,
/// and `??` renders a literal `?`. Returns the rendered SQL and the next free
/// parameter number.
pub(crate) fn number_placeholders(sql: &str, first: usize) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut next = first;
    let mut in_ident = false;
    let mut in_literal = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_literal => {
                in_ident = !in_ident;
                out.push(c);
            }
            '\'' if !in_ident => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_ident && !in_literal => {
                if chars.peek() == Some(&'?') {
                    chars.next();
                    out.push('?');
                } else {
                    out.push('$');
                    out.push_str(&next.to_string());
                    next += 1;
                }
            }
            _ => out.push(c),
        }
    }

    (out, next)
}
