use super::{Handle, Repository};
use crate::errors::DbStoreError;
use futures::FutureExt;
use sqlx::{Postgres, Transaction};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Shared handle to one open transaction.
///
/// Clones refer to the same transaction. Statements issued through clones are
/// serialized on the underlying connection. Once committed or rolled back the
/// handle is closed and further use fails with
/// [`DbStoreError::TransactionClosed`].
#[derive(Clone)]
pub struct TxHandle {
    inner: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl std::fmt::Debug for TxHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxHandle").finish_non_exhaustive()
    }
}

impl TxHandle {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<Transaction<'static, Postgres>>> {
        self.inner.lock().await
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    pub async fn commit(&self) -> Result<(), DbStoreError> {
        let tx = self
            .inner
            .lock()
            .await
            .take()
            .ok_or(DbStoreError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(&self) -> Result<(), DbStoreError> {
        let tx = self
            .inner
            .lock()
            .await
            .take()
            .ok_or(DbStoreError::TransactionClosed)?;
        tx.rollback().await?;
        Ok(())
    }
}

impl Repository {
    /// Begin a transaction on the pool and wrap it in a handle.
    /// The caller owns commit and rollback.
    pub async fn begin(&self) -> Result<TxHandle, DbStoreError> {
        match &self.handle {
            Handle::Pool(pool) => Ok(TxHandle::new(pool.begin().await?)),
            Handle::Tx(_) => Err(DbStoreError::configuration(
                "repository is already bound to a transaction",
            )),
        }
    }

    /// Run `f` inside one transaction.
    ///
    /// `f` receives a repository bound to the transaction. `Ok` commits,
    /// `Err` rolls back and is returned unchanged, and a panic rolls back
    /// before resuming. A repository already bound to a transaction runs `f`
    /// inside that same transaction and leaves the outcome to the outer caller.
    pub async fn transaction<F, Fut, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(Repository) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<DbStoreError>,
    {
        let pool = match &self.handle {
            Handle::Tx(_) => return f(self.clone()).await,
            Handle::Pool(pool) => pool,
        };

        let handle = TxHandle::new(pool.begin().await.map_err(DbStoreError::from)?);
        let repo = self.with_tx(handle.clone());
        debug!("[TRANSACTION] begin");

        let outcome = AssertUnwindSafe(async move { f(repo).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => {
                handle.commit().await?;
                debug!("[TRANSACTION] commit");
                Ok(value)
            }
            Ok(Err(err)) => {
                if let Err(rollback_err) = handle.rollback().await {
                    warn!("[TRANSACTION] rollback failed: {}", rollback_err);
                } else {
                    debug!("[TRANSACTION] rollback");
                }
                Err(err)
            }
            Err(panic) => {
                if let Err(rollback_err) = handle.rollback().await {
                    warn!("[TRANSACTION] rollback after panic failed: {}", rollback_err);
                }
                std::panic::resume_unwind(panic)
            }
        }
    }
}
