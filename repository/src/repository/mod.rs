//! Generic repository
//!
//! A [`Repository`] runs CRUD statements for any [`TableMetadata`] record
//! against either a connection pool or a shared transaction handle. It holds
//! nothing else, so it is cheap to clone and can be shared across tasks when
//! bound to a pool.
//!
//! [`TableMetadata`]: crate::traits::TableMetadata

mod crud;
mod transaction;

pub use transaction::TxHandle;

use crate::errors::DbStoreError;
use crate::value::SqlValue;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{PgConnection, PgPool, Postgres};
use std::time::Duration;
use tracing::warn;

/// SQLSTATE raised when `statement_timeout` cancels a statement
const QUERY_CANCELED: &str = "57014";

/// Run `$call` against whichever executor the repository is bound to.
///
/// With a timeout the deadline is enforced by the server through
/// `SET LOCAL statement_timeout`, so a statement past its deadline is
/// cancelled and its writes never land. Pool-bound calls get a short
/// transaction of their own to scope the setting.
macro_rules! on_executor {
    ($repo:expr, |$exec:ident| $call:expr) => {{
        let repo = $repo;
        match &repo.handle {
            Handle::Pool(pool) => match repo.timeout {
                None => {
                    let $exec = pool;
                    $call.await.map_err(|e| repo.classify(e))
                }
                Some(limit) => {
                    let mut tx = pool.begin().await?;
                    set_statement_timeout(&mut *tx, Some(limit)).await?;
                    let result = {
                        let $exec = &mut *tx;
                        $call.await
                    };
                    match result {
                        Ok(value) => {
                            tx.commit().await?;
                            Ok(value)
                        }
                        Err(err) => {
                            if let Err(rollback_err) = tx.rollback().await {
                                warn!("[TIMEOUT] rollback failed: {}", rollback_err);
                            }
                            Err(repo.classify(err))
                        }
                    }
                }
            },
            Handle::Tx(tx) => {
                let mut guard = tx.lock().await;
                match guard.as_mut() {
                    Some(conn) => {
                        if repo.timeout.is_some() {
                            set_statement_timeout(&mut **conn, repo.timeout).await?;
                        }
                        let result = {
                            let $exec = &mut **conn;
                            $call.await
                        };
                        match result {
                            Ok(value) => {
                                if repo.timeout.is_some() {
                                    set_statement_timeout(&mut **conn, None).await?;
                                }
                                Ok(value)
                            }
                            Err(err) => Err(repo.classify(err)),
                        }
                    }
                    None => Err(DbStoreError::TransactionClosed),
                }
            }
        }
    }};
}

// Bind a statement parameter as the PostgreSQL type its variant names
macro_rules! bind_value {
    ($query:expr, $value:expr) => {
        match $value {
            SqlValue::Null => $query.bind(Option::<String>::None),
            SqlValue::Bool(b) => $query.bind(b),
            SqlValue::I32(i) => $query.bind(i),
            SqlValue::I64(i) => $query.bind(i),
            SqlValue::F64(f) => $query.bind(f),
            SqlValue::Text(s) => $query.bind(s),
            SqlValue::Uuid(u) => $query.bind(u),
            SqlValue::Timestamp(t) => $query.bind(t),
            SqlValue::Json(v) => $query.bind(sqlx::types::Json(v)),
        }
    };
}

#[derive(Clone)]
enum Handle {
    Pool(PgPool),
    Tx(TxHandle),
}

/// CRUD and transaction operations over any record type
#[derive(Clone)]
pub struct Repository {
    handle: Handle,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("transactional", &self.is_transactional())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Repository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            handle: Handle::Pool(pool),
            timeout: None,
        }
    }

    /// Repository bound to an already-started transaction
    pub fn from_tx(tx: sqlx::Transaction<'static, Postgres>) -> Self {
        Self {
            handle: Handle::Tx(TxHandle::new(tx)),
            timeout: None,
        }
    }

    /// Same repository, rebound to an existing transaction handle so that
    /// every call made through it joins that unit of work
    pub fn with_tx(&self, tx: TxHandle) -> Self {
        Self {
            handle: Handle::Tx(tx),
            timeout: self.timeout,
        }
    }

    /// Cancel, on the server, any single statement that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_transactional(&self) -> bool {
        matches!(self.handle, Handle::Tx(_))
    }

    /// The transaction this repository is bound to, if any
    pub fn tx_handle(&self) -> Option<&TxHandle> {
        match &self.handle {
            Handle::Tx(tx) => Some(tx),
            Handle::Pool(_) => None,
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        match &self.handle {
            Handle::Pool(pool) => Some(pool),
            Handle::Tx(_) => None,
        }
    }

    /// Report a statement cancelled by this repository's deadline as a timeout
    fn classify(&self, err: sqlx::Error) -> DbStoreError {
        if let (Some(limit), sqlx::Error::Database(db_err)) = (self.timeout, &err) {
            if db_err.code().as_deref() == Some(QUERY_CANCELED) {
                return DbStoreError::Timeout(limit);
            }
        }
        DbStoreError::from(err)
    }

    async fn execute(&self, query: Query<'_, Postgres, PgArguments>) -> Result<u64, DbStoreError> {
        let result = on_executor!(self, |exec| query.execute(exec))?;
        Ok(result.rows_affected())
    }

    async fn fetch_all<T>(
        &self,
        query: QueryAs<'_, Postgres, T, PgArguments>,
    ) -> Result<Vec<T>, DbStoreError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        on_executor!(self, |exec| query.fetch_all(exec))
    }

    async fn fetch_one<T>(
        &self,
        query: QueryAs<'_, Postgres, T, PgArguments>,
    ) -> Result<T, DbStoreError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        on_executor!(self, |exec| query.fetch_one(exec))
    }

    async fn fetch_scalar(
        &self,
        query: QueryScalar<'_, Postgres, i64, PgArguments>,
    ) -> Result<i64, DbStoreError> {
        on_executor!(self, |exec| query.fetch_one(exec))
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: Vec<SqlValue>,
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = bind_value!(query, param);
    }
    query
}

fn bind_params_as<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    params: Vec<SqlValue>,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    for param in params {
        query = bind_value!(query, param);
    }
    query
}

fn bind_params_scalar<'q>(
    mut query: QueryScalar<'q, Postgres, i64, PgArguments>,
    params: Vec<SqlValue>,
) -> QueryScalar<'q, Postgres, i64, PgArguments> {
    for param in params {
        query = bind_value!(query, param);
    }
    query
}

/// `SET LOCAL` the deadline for the current transaction, or restore the
/// session default when `limit` is `None`
async fn set_statement_timeout(
    conn: &mut PgConnection,
    limit: Option<Duration>,
) -> Result<(), sqlx::Error> {
    let sql = match limit {
        // 0 would disable the timeout
        Some(limit) => format!(
            "SET LOCAL statement_timeout = {}",
            limit.as_millis().max(1)
        ),
        None => "SET LOCAL statement_timeout TO DEFAULT".to_string(),
    };
    sqlx::query(&sql).execute(conn).await?;
    Ok(())
}
