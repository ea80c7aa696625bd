use super::where_clause::{Filterable, WhereClause};
use super::{number_placeholders, quote_ident};
use crate::traits::TableMetadata;
use crate::value::SqlValue;

/// UPDATE statement over one table.
///
/// Parameter order in the rendered SQL: record columns bound by the caller
/// (`$1..$k`), then explicit [`set`](Self::set) values, then WHERE parameters.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    table: String,
    bound_columns: Vec<String>,
    assignments: Vec<(String, SqlValue)>,
    where_clause: WhereClause,
}

impl UpdateQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            bound_columns: Vec::new(),
            assignments: Vec::new(),
            where_clause: WhereClause::new(),
        }
    }

    /// Update every non-key column of `T`, with values bound from a record
    pub fn for_model<T: TableMetadata>() -> Self {
        let mut query = Self::new(T::table_name());
        query.bound_columns = T::non_key_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        query
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns whose values the caller binds ahead of [`to_sql`](Self::to_sql)'s parameters
    pub fn bound_columns(&self) -> &[String] {
        &self.bound_columns
    }

    /// `SET column = value` with a parameter bound from `value`
    pub fn set(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.assignments.push((column.to_string(), value.into()));
        self
    }

    pub fn has_assignments(&self) -> bool {
        !self.bound_columns.is_empty() || !self.assignments.is_empty()
    }

    /// Render the statement and the parameters following the bound columns
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut next = 1;
        let mut set_items = Vec::with_capacity(self.bound_columns.len() + self.assignments.len());

        for column in self.bound_columns.iter().chain(self.assignments.iter().map(|(c, _)| c)) {
            set_items.push(format!("{} = ${}", quote_ident(column), next));
            next += 1;
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_ident(&self.table),
            set_items.join(", ")
        );

        if !self.where_clause.is_empty() {
            let (conditions, _) = number_placeholders(&self.where_clause.to_sql(), next);
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }

        let mut params: Vec<SqlValue> = self.assignments.iter().map(|(_, v)| v.clone()).collect();
        params.extend_from_slice(self.where_clause.params());
        (sql, params)
    }
}

impl Filterable for UpdateQuery {
    fn where_clause(&self) -> &WhereClause {
        &self.where_clause
    }

    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}
