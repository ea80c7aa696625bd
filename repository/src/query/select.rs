use super::ordering::SortOrder;
use super::where_clause::{Filterable, WhereClause};
use super::{number_placeholders, quote_ident};
use crate::traits::TableMetadata;
use crate::value::SqlValue;

/// SELECT statement over one table
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    columns: Vec<String>,
    where_clause: WhereClause,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<i64>,
}

impl SelectQuery {
    /// `SELECT * FROM table`
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            where_clause: WhereClause::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Select the mapped columns of `T` from its table
    pub fn for_model<T: TableMetadata>() -> Self {
        let mut query = Self::new(T::table_name());
        query.columns = T::columns().iter().map(|c| c.to_string()).collect();
        query
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Add ordering on `column`. Blank `direction` adds nothing.
    ///
    /// # Panics
    /// When `direction` is neither blank nor `asc`/`desc` in any case.
    pub fn order_by(&mut self, column: &str, direction: &str) -> &mut Self {
        if let Some(order) = SortOrder::parse(direction) {
            self.order_by_sort(column, order);
        }
        self
    }

    pub fn order_by_sort(&mut self, column: &str, order: SortOrder) -> &mut Self {
        self.order_by.push((column.to_string(), order));
        self
    }

    /// Limit the row count, flooring negative values at 0
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.limit = Some(n.max(0));
        self
    }

    pub fn current_limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn ordering(&self) -> &[(String, SortOrder)] {
        &self.order_by
    }

    /// Render the statement and its parameters
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = String::with_capacity(64 + self.table.len());
        sql.push_str("SELECT ");
        sql.push_str(&columns);
        sql.push_str(" FROM ");
        sql.push_str(&quote_ident(&self.table));

        if !self.where_clause.is_empty() {
            let (conditions, _) = number_placeholders(&self.where_clause.to_sql(), 1);
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }

        if !self.order_by.is_empty() {
            let order_items: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, order)| format!("{} {}", quote_ident(column), order.to_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_items.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }

        (sql, self.where_clause.params().to_vec())
    }

    /// `SELECT COUNT(*)` over the same table and conditions, ignoring order and limit
    pub fn to_count_sql(&self) -> (String, Vec<SqlValue>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&self.table));
        if !self.where_clause.is_empty() {
            let (conditions, _) = number_placeholders(&self.where_clause.to_sql(), 1);
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }
        (sql, self.where_clause.params().to_vec())
    }
}

impl Filterable for SelectQuery {
    fn where_clause(&self) -> &WhereClause {
        &self.where_clause
    }

    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}
