//! Error type for `arcade-store-sqlite`.
//!
//! Used for connection setup and row decoding. Inside a transaction every
//! error is converted into an [`arcade_core::Error`] before it leaves the
//! crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<Error> for arcade_core::Error {
  fn from(e: Error) -> Self { arcade_core::Error::storage(e) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
