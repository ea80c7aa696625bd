use super::where_clause::{Filterable, WhereClause};
use super::{number_placeholders, quote_ident};
use crate::value::SqlValue;

/// DELETE statement over one table
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    table: String,
    where_clause: WhereClause,
}

impl DeleteQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            where_clause: WhereClause::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.table));
        if !self.where_clause.is_empty() {
            let (conditions, _) = number_placeholders(&self.where_clause.to_sql(), 1);
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }
        (sql, self.where_clause.params().to_vec())
    }
}

impl Filterable for DeleteQuery {
    fn where_clause(&self) -> &WhereClause {
        &self.where_clause
    }

    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}
