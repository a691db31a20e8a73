//! The `LedgerStore` and `LedgerTx` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `arcade-store-sqlite`). The engine in this crate depends only on these
//! abstractions.
//!
//! Every workflow runs inside exactly one transaction. A [`LedgerStore`] opens
//! it, hands a [`LedgerTx`] to a closure, commits if the closure returns `Ok`
//! and rolls back on any other exit. Storage calls on a [`LedgerTx`] are
//! blocking; the closure runs on a thread owned by the backend, never on the
//! async runtime.

use std::future::Future;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Result,
  cart::{CartItem, CartSort, LibraryItem, LibrarySort},
  game::{Game, GamePatch, NewGame, NewPublisher, Publisher, PublisherPatch},
  invoice::Invoice,
  page::{Page, PageRequest},
  user::{NewUser, User, UserPatch},
};

// ─── Transaction handle ──────────────────────────────────────────────────────

/// Operations available inside an open transaction.
///
/// Implementations map every constraint failure to one [`crate::Error`]
/// variant; raw storage errors surface only as
/// [`Error::Storage`](crate::Error::Storage). Writes inside a read-only
/// transaction fail with
/// [`Error::InvariantViolation`](crate::Error::InvariantViolation).
pub trait LedgerTx {
  // ── Identity ──────────────────────────────────────────────────────────

  fn create_user(&self, input: &NewUser) -> Result<User>;

  fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

  /// Apply `patch` and return the updated user. An unknown id fails with
  /// [`Error::UserNotFound`](crate::Error::UserNotFound); a taken username,
  /// email or vatin with [`Error::AlreadyExists`](crate::Error::AlreadyExists).
  fn patch_user(&self, user_id: Uuid, patch: &UserPatch) -> Result<User>;

  /// Overwrite a user's balance. Only the purchase workflow calls this.
  fn set_balance(&self, user_id: Uuid, balance: Decimal) -> Result<()>;

  // ── Catalog ───────────────────────────────────────────────────────────

  fn create_publisher(&self, input: &NewPublisher) -> Result<Publisher>;

  fn get_publisher(&self, publisher_id: Uuid) -> Result<Option<Publisher>>;

  /// Apply `patch` and return the updated publisher. An unknown id fails with
  /// [`Error::PublisherNotFound`](crate::Error::PublisherNotFound).
  fn patch_publisher(&self, publisher_id: Uuid, patch: &PublisherPatch) -> Result<Publisher>;

  fn create_game(&self, input: &NewGame) -> Result<Game>;

  fn get_game(&self, game_id: Uuid) -> Result<Option<Game>>;

  /// Apply `patch` and return the updated game. An unknown id fails with
  /// [`Error::GameNotFound`](crate::Error::GameNotFound).
  fn patch_game(&self, game_id: Uuid, patch: &GamePatch) -> Result<Game>;

  // ── Cart ──────────────────────────────────────────────────────────────

  /// Insert a cart entry. A duplicate fails with
  /// [`Error::UserCartGameAlreadyExists`](crate::Error::UserCartGameAlreadyExists).
  fn insert_cart_entry(&self, user_id: Uuid, game_id: Uuid) -> Result<()>;

  /// Remove a cart entry. An absent entry fails with
  /// [`Error::UserCartGameNotFound`](crate::Error::UserCartGameNotFound).
  fn delete_cart_entry(&self, user_id: Uuid, game_id: Uuid) -> Result<()>;

  fn list_cart(
    &self,
    user_id: Uuid,
    page: &PageRequest<CartSort>,
  ) -> Result<Page<CartItem>>;

  // ── Library ───────────────────────────────────────────────────────────

  fn exists_library_entry(&self, user_id: Uuid, game_id: Uuid) -> Result<bool>;

  fn list_library(
    &self,
    user_id: Uuid,
    page: &PageRequest<LibrarySort>,
  ) -> Result<Page<LibraryItem>>;

  // ── Purchase ──────────────────────────────────────────────────────────

  /// Atomically move the user's cart into the library and record `invoice`.
  ///
  /// Deletes every cart entry of `invoice.user_id`, inserts one library entry
  /// per invoice line, then inserts the invoice header and lines. Either all
  /// of it is applied or none of it is. A line whose game the user already
  /// owns fails with
  /// [`Error::UserLibraryGameAlreadyExists`](crate::Error::UserLibraryGameAlreadyExists);
  /// dangling references fail with
  /// [`Error::UserNotFound`](crate::Error::UserNotFound) or
  /// [`Error::GameNotFound`](crate::Error::GameNotFound).
  fn purchase_cart(&self, invoice: &Invoice) -> Result<()>;

  fn list_invoices(&self, user_id: Uuid) -> Result<Vec<Invoice>>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A transactional ledger backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LedgerStore: Send + Sync {
  /// Run `f` in a read-only transaction at read-committed isolation or
  /// better.
  fn read_only<F, T>(&self, f: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    F: FnOnce(&dyn LedgerTx) -> Result<T> + Send + 'static,
    T: Send + 'static;

  /// Run `f` in a read-write transaction at repeatable-read isolation or
  /// better. Commits only when `f` returns `Ok`.
  fn read_write<F, T>(&self, f: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    F: FnOnce(&dyn LedgerTx) -> Result<T> + Send + 'static,
    T: Send + 'static;
}
