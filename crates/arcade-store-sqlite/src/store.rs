//! [`SqliteStore`]: the SQLite implementation of [`LedgerStore`].

use std::path::Path;

use arcade_core::store::{LedgerStore, LedgerTx};
use rusqlite::TransactionBehavior;

use crate::{Result, schema::SCHEMA, tx::SqliteTx};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Arcade ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All access
/// goes through one connection thread, so write transactions are serialised.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite ledger");
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` inside a transaction opened with `behavior`.
  ///
  /// The transaction commits only when `f` returns `Ok`; any other exit drops
  /// it, which rolls it back.
  async fn run<F, T>(
    &self,
    behavior: TransactionBehavior,
    writable: bool,
    f: F,
  ) -> arcade_core::Result<T>
  where
    F: FnOnce(&dyn LedgerTx) -> arcade_core::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(behavior)?;
        let outcome = f(&SqliteTx::new(&tx, writable));
        match outcome {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(e) => {
            tracing::debug!(error = %e, "rolling back transaction");
            Ok(Err(e))
          }
        }
      })
      .await
      .map_err(crate::Error::from)?
  }
}

impl LedgerStore for SqliteStore {
  async fn read_only<F, T>(&self, f: F) -> arcade_core::Result<T>
  where
    F: FnOnce(&dyn LedgerTx) -> arcade_core::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.run(TransactionBehavior::Deferred, false, f).await
  }

  async fn read_write<F, T>(&self, f: F) -> arcade_core::Result<T>
  where
    F: FnOnce(&dyn LedgerTx) -> arcade_core::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.run(TransactionBehavior::Immediate, true, f).await
  }
}
