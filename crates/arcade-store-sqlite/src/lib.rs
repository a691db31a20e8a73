//! SQLite backend for the Arcade ledger.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Read-only transactions open
//! `DEFERRED`; read-write transactions open `IMMEDIATE` and therefore run one
//! at a time.

mod encode;
mod schema;
mod store;
mod tx;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
