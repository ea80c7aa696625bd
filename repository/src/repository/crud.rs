use super::{bind_params, bind_params_as, bind_params_scalar, Repository};
use crate::errors::DbStoreError;
use crate::filter::Predicate;
use crate::pagination::{paginate, PaginationParams};
use crate::query::{quote_ident, DeleteQuery, Filterable, SelectQuery, UpdateQuery};
use crate::traits::TableMetadata;
use tracing::debug;

const MISSING_WHERE: &str = "UPDATE and DELETE statements require at least one WHERE condition";

/// Bind parameters PostgreSQL accepts in one statement
const MAX_BIND_PARAMS: usize = 65535;

/// What a multi-row insert does when a row's key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnConflict {
    Fail,
    Ignore,
    Overwrite,
}

impl Repository {
    // ========================================
    // Create
    // ========================================

    /// Insert one record. With `ignore_duplicates` a conflicting row is left
    /// untouched and the call reports 0 affected rows instead of failing.
    pub async fn create<T: TableMetadata>(
        &self,
        record: &T,
        ignore_duplicates: bool,
    ) -> Result<u64, DbStoreError> {
        self.create_bulk(std::slice::from_ref(record), ignore_duplicates)
            .await
    }

    /// Insert several records with multi-row statements.
    ///
    /// Batches too large for one statement are split, and the pieces run in
    /// one transaction so the batch still lands or fails as a whole.
    pub async fn create_bulk<T: TableMetadata>(
        &self,
        records: &[T],
        ignore_duplicates: bool,
    ) -> Result<u64, DbStoreError> {
        let on_conflict = if ignore_duplicates {
            OnConflict::Ignore
        } else {
            OnConflict::Fail
        };
        self.insert_batched(records, on_conflict).await
    }

    async fn insert_batched<T: TableMetadata>(
        &self,
        records: &[T],
        on_conflict: OnConflict,
    ) -> Result<u64, DbStoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let chunk_size = rows_per_statement(T::columns().len());
        if records.len() <= chunk_size {
            return self.insert_rows(records, on_conflict).await;
        }

        debug!(
            table = T::table_name(),
            rows = records.len(),
            chunk_size,
            "[BULK] splitting insert"
        );
        self.transaction(|repo| async move {
            let mut affected = 0;
            for rows in records.chunks(chunk_size) {
                affected += repo.insert_rows(rows, on_conflict).await?;
            }
            Ok::<_, DbStoreError>(affected)
        })
        .await
    }

    async fn insert_rows<T: TableMetadata>(
        &self,
        rows: &[T],
        on_conflict: OnConflict,
    ) -> Result<u64, DbStoreError> {
        let sql = match on_conflict {
            OnConflict::Fail => insert_sql(T::table_name(), T::columns(), rows.len()),
            OnConflict::Ignore => format!(
                "{} ON CONFLICT DO NOTHING",
                insert_sql(T::table_name(), T::columns(), rows.len())
            ),
            OnConflict::Overwrite => upsert_sql(
                T::table_name(),
                T::columns(),
                T::primary_key_field(),
                rows.len(),
            ),
        };
        if on_conflict == OnConflict::Overwrite {
            debug!(table = T::table_name(), rows = rows.len(), "[UPSERT] SQL: {}", sql);
        } else {
            debug!(table = T::table_name(), rows = rows.len(), "[CREATE] SQL: {}", sql);
        }

        let mut query = sqlx::query(&sql);
        for row in rows {
            query = row.bind_columns(query);
        }
        self.execute(query).await
    }

    // ========================================
    // Read
    // ========================================

    /// Fetch the record whose primary key equals `id`.
    /// A missing row is reported as [`sqlx::Error::RowNotFound`].
    pub async fn find_one_by_pk<T: TableMetadata>(&self, id: &T::Id) -> Result<T, DbStoreError> {
        let sql = format!(
            "{} WHERE {} = $1 LIMIT 1",
            SelectQuery::for_model::<T>().to_sql().0,
            quote_ident(T::primary_key_field())
        );
        debug!(table = T::table_name(), id = ?id, "[FIND_BY_PK] SQL: {}", sql);

        let query = sqlx::query_as::<_, T>(&sql).bind(id.clone());
        self.fetch_one(query).await
    }

    /// Reload a record from the row sharing its primary key
    pub async fn reload<T: TableMetadata>(&self, record: &T) -> Result<T, DbStoreError> {
        self.find_one_by_pk::<T>(&record.extract_id()).await
    }

    /// First record matching every present predicate
    pub async fn find_one_where<T: TableMetadata>(
        &self,
        predicates: impl IntoIterator<Item = Option<Predicate>>,
    ) -> Result<T, DbStoreError> {
        let mut select = SelectQuery::for_model::<T>();
        for predicate in predicates {
            select.filter(predicate);
        }
        self.find_one_select(select).await
    }

    /// First record of a select shaped by `criteria`
    pub async fn find_one_with<T, F>(&self, criteria: F) -> Result<T, DbStoreError>
    where
        T: TableMetadata,
        F: FnOnce(&mut SelectQuery),
    {
        let mut select = SelectQuery::for_model::<T>();
        criteria(&mut select);
        self.find_one_select(select).await
    }

    /// Every record matching the present predicates, optionally paginated
    pub async fn find_many_where<T: TableMetadata>(
        &self,
        pagination: Option<&PaginationParams>,
        predicates: impl IntoIterator<Item = Option<Predicate>>,
    ) -> Result<Vec<T>, DbStoreError> {
        let mut select = SelectQuery::for_model::<T>();
        for predicate in predicates {
            select.filter(predicate);
        }
        self.find_many_select(select, pagination).await
    }

    /// Records of a select shaped by `criteria`, optionally paginated.
    /// Pagination is applied after `criteria`, so its ordering comes last.
    pub async fn find_many_with<T, F>(
        &self,
        pagination: Option<&PaginationParams>,
        criteria: F,
    ) -> Result<Vec<T>, DbStoreError>
    where
        T: TableMetadata,
        F: FnOnce(&mut SelectQuery),
    {
        let mut select = SelectQuery::for_model::<T>();
        criteria(&mut select);
        self.find_many_select(select, pagination).await
    }

    pub async fn find_all<T: TableMetadata>(&self) -> Result<Vec<T>, DbStoreError> {
        self.find_many_select(SelectQuery::for_model::<T>(), None)
            .await
    }

    /// Number of rows matching the present predicates
    pub async fn count_where<T: TableMetadata>(
        &self,
        predicates: impl IntoIterator<Item = Option<Predicate>>,
    ) -> Result<i64, DbStoreError> {
        let mut select = SelectQuery::for_model::<T>();
        for predicate in predicates {
            select.filter(predicate);
        }

        let (sql, params) = select.to_count_sql();
        debug!(table = T::table_name(), "[COUNT] SQL: {}", sql);

        let query = bind_params_scalar(sqlx::query_scalar::<_, i64>(&sql), params);
        self.fetch_scalar(query).await
    }

    async fn find_one_select<T: TableMetadata>(
        &self,
        mut select: SelectQuery,
    ) -> Result<T, DbStoreError> {
        select.limit(1);
        let (sql, params) = select.to_sql();
        debug!(table = T::table_name(), "[FIND_ONE] SQL: {}", sql);

        let query = bind_params_as(sqlx::query_as::<_, T>(&sql), params);
        self.fetch_one(query).await
    }

    async fn find_many_select<T: TableMetadata>(
        &self,
        mut select: SelectQuery,
        pagination: Option<&PaginationParams>,
    ) -> Result<Vec<T>, DbStoreError> {
        if let Some(params) = pagination {
            paginate(&mut select, params)?;
        }
        let (sql, params) = select.to_sql();
        debug!(table = T::table_name(), "[FIND_MANY] SQL: {}", sql);

        let query = bind_params_as(sqlx::query_as::<_, T>(&sql), params);
        self.fetch_all(query).await
    }

    // ========================================
    // Update
    // ========================================

    /// Overwrite every non-key column of the row sharing the record's primary key
    pub async fn update_one_by_pk<T: TableMetadata>(&self, record: &T) -> Result<u64, DbStoreError> {
        let non_key = T::non_key_columns();
        if non_key.is_empty() {
            return Ok(0);
        }

        let sql = update_by_pk_sql(T::table_name(), &non_key, T::primary_key_field());
        debug!(table = T::table_name(), id = ?record.extract_id(), "[UPDATE_BY_PK] SQL: {}", sql);

        let query = record
            .bind_non_key_columns(sqlx::query(&sql))
            .bind(record.extract_id());
        self.execute(query).await
    }

    /// Update each record by primary key as one unit of work.
    /// Joins the current transaction when there is one, otherwise opens its own.
    pub async fn update_many_by_pk<T: TableMetadata>(
        &self,
        records: &[T],
    ) -> Result<u64, DbStoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        self.transaction(|repo| async move {
            let mut affected = 0;
            for record in records {
                affected += repo.update_one_by_pk(record).await?;
            }
            Ok::<_, DbStoreError>(affected)
        })
        .await
    }

    /// Write the record's non-key columns into every row matched by `criteria`.
    /// Fails without touching the database when `criteria` adds no condition.
    /// A record with no non-key columns has nothing to write and reports 0.
    pub async fn update_one_where<T, F>(&self, record: &T, criteria: F) -> Result<u64, DbStoreError>
    where
        T: TableMetadata,
        F: FnOnce(&mut UpdateQuery),
    {
        if T::non_key_columns().is_empty() {
            return Ok(0);
        }

        let mut update = UpdateQuery::for_model::<T>();
        criteria(&mut update);
        if update.where_clause().is_empty() {
            return Err(DbStoreError::configuration(MISSING_WHERE));
        }

        let (sql, params) = update.to_sql();
        debug!(table = T::table_name(), "[UPDATE_WHERE] SQL: {}", sql);

        let query = bind_params(record.bind_non_key_columns(sqlx::query(&sql)), params);
        self.execute(query).await
    }

    /// Run an UPDATE whose SET list and conditions both come from `criteria`
    pub async fn update_with<T, F>(&self, criteria: F) -> Result<u64, DbStoreError>
    where
        T: TableMetadata,
        F: FnOnce(&mut UpdateQuery),
    {
        let mut update = UpdateQuery::new(T::table_name());
        criteria(&mut update);
        if !update.has_assignments() {
            return Ok(0);
        }
        if update.where_clause().is_empty() {
            return Err(DbStoreError::configuration(MISSING_WHERE));
        }

        let (sql, params) = update.to_sql();
        debug!(table = T::table_name(), "[UPDATE_WITH] SQL: {}", sql);

        self.execute(bind_params(sqlx::query(&sql), params)).await
    }

    /// Insert the records, overwriting the non-key columns of rows whose
    /// primary key already exists. Large batches are split like
    /// [`create_bulk`](Self::create_bulk).
    pub async fn upsert<T: TableMetadata>(&self, records: &[T]) -> Result<u64, DbStoreError> {
        self.insert_batched(records, OnConflict::Overwrite).await
    }

    // ========================================
    // Delete
    // ========================================

    pub async fn delete_by_pk<T: TableMetadata>(&self, record: &T) -> Result<u64, DbStoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            quote_ident(T::table_name()),
            quote_ident(T::primary_key_field())
        );
        debug!(table = T::table_name(), id = ?record.extract_id(), "[DELETE_BY_PK] SQL: {}", sql);

        self.execute(sqlx::query(&sql).bind(record.extract_id()))
            .await
    }

    /// Delete every row whose primary key matches one of the records.
    /// Key lists too long for one statement are split inside one transaction.
    pub async fn delete_many_by_pk<T: TableMetadata>(
        &self,
        records: &[T],
    ) -> Result<u64, DbStoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        if records.len() <= MAX_BIND_PARAMS {
            return self.delete_keys(records).await;
        }

        self.transaction(|repo| async move {
            let mut affected = 0;
            for rows in records.chunks(MAX_BIND_PARAMS) {
                affected += repo.delete_keys(rows).await?;
            }
            Ok::<_, DbStoreError>(affected)
        })
        .await
    }

    async fn delete_keys<T: TableMetadata>(&self, records: &[T]) -> Result<u64, DbStoreError> {
        let placeholders: Vec<String> = (1..=records.len()).map(|i| format!("${}", i)).collect();
        let sql = format!(
            "DELETE FROM {} WHERE {} IN ({})",
            quote_ident(T::table_name()),
            quote_ident(T::primary_key_field()),
            placeholders.join(", ")
        );
        debug!(table = T::table_name(), rows = records.len(), "[DELETE_MANY_BY_PK] SQL: {}", sql);

        let mut query = sqlx::query(&sql);
        for record in records {
            query = query.bind(record.extract_id());
        }
        self.execute(query).await
    }

    /// Delete the rows matching every present predicate.
    /// Fails when no predicate is present rather than emptying the table.
    pub async fn delete_where<T: TableMetadata>(
        &self,
        predicates: impl IntoIterator<Item = Option<Predicate>>,
    ) -> Result<u64, DbStoreError> {
        self.delete_with::<T, _>(|delete| {
            for predicate in predicates {
                delete.filter(predicate);
            }
        })
        .await
    }

    /// Delete the rows matched by `criteria`
    pub async fn delete_with<T, F>(&self, criteria: F) -> Result<u64, DbStoreError>
    where
        T: TableMetadata,
        F: FnOnce(&mut DeleteQuery),
    {
        let mut delete = DeleteQuery::new(T::table_name());
        criteria(&mut delete);
        if delete.where_clause().is_empty() {
            return Err(DbStoreError::configuration(MISSING_WHERE));
        }

        let (sql, params) = delete.to_sql();
        debug!(table = T::table_name(), "[DELETE_WHERE] SQL: {}", sql);

        self.execute(bind_params(sqlx::query(&sql), params)).await
    }
}

/// Rows of `width` columns that fit in one statement's parameters
pub(crate) fn rows_per_statement(width: usize) -> usize {
    (MAX_BIND_PARAMS / width.max(1)).max(1)
}

/// `($1, $2), ($3, $4)` for `rows` rows of `width` columns
fn values_rows(width: usize, rows: usize) -> String {
    (0..rows)
        .map(|row| {
            let slots: Vec<String> = (1..=width)
                .map(|col| format!("${}", row * width + col))
                .collect();
            format!("({})", slots.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn insert_sql(table: &str, columns: &[&str], rows: usize) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list(columns),
        values_rows(columns.len(), rows)
    )
}

pub(crate) fn upsert_sql(table: &str, columns: &[&str], primary_key: &str, rows: usize) -> String {
    let updates: Vec<String> = columns
        .iter()
        .filter(|c| **c != primary_key)
        .map(|c| format!("{col} = EXCLUDED.{col}", col = quote_ident(c)))
        .collect();

    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "{} ON CONFLICT ({}) {}",
        insert_sql(table, columns, rows),
        quote_ident(primary_key),
        action
    )
}

pub(crate) fn update_by_pk_sql(table: &str, non_key: &[&str], primary_key: &str) -> String {
    let set_items: Vec<String> = non_key
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", quote_ident(c), i + 1))
        .collect();

    format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        quote_ident(table),
        set_items.join(", "),
        quote_ident(primary_key),
        non_key.len() + 1
    )
}
