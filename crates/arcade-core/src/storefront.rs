//! [`Storefront`]: the entry point for every commerce workflow.
//!
//! Each method opens exactly one transaction on the [`LedgerStore`]:
//! read-only for reads, read-write for anything that writes. Failures are
//! logged once here, business outcomes at `info` and faults at `error`.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
  Error, Result,
  cart::{CartItem, CartSort, LibraryItem, LibrarySort},
  eligibility,
  game::{Game, GamePatch, NewGame, NewPublisher, Publisher, PublisherPatch},
  invoice::Invoice,
  money::TaxRate,
  notify::NotificationSender,
  page::{MAX_LIMIT, Page, PageRequest},
  purchase::{self, PurchaseRequest},
  store::LedgerStore,
  user::{NewUser, User, UserPatch},
};

/// Cart entries fetched per page while draining a cart.
pub const DEFAULT_DRAIN_BATCH: u32 = 100;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Deployment-level commerce settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CommerceConfig {
  #[serde(default)]
  pub tax_rate:    TaxRate,
  #[serde(default = "default_drain_batch")]
  pub drain_batch: u32,
}

fn default_drain_batch() -> u32 { DEFAULT_DRAIN_BATCH }

impl Default for CommerceConfig {
  fn default() -> Self {
    Self { tax_rate: TaxRate::default(), drain_batch: DEFAULT_DRAIN_BATCH }
  }
}

impl CommerceConfig {
  pub fn validate(&self) -> Result<()> {
    if self.drain_batch == 0 || self.drain_batch > MAX_LIMIT {
      return Err(Error::InvalidField("drain_batch"));
    }
    Ok(())
  }
}

// ─── Logging ─────────────────────────────────────────────────────────────────

fn log_failure(method: &'static str, user_id: Option<Uuid>, game_id: Option<Uuid>, e: &Error) {
  let user_id = user_id.map(|id| id.to_string());
  let game_id = game_id.map(|id| id.to_string());
  if e.is_business() {
    tracing::info!(
      service.method = method,
      user.id = user_id.as_deref(),
      game.id = game_id.as_deref(),
      error = %e,
      "request rejected"
    );
  } else {
    tracing::error!(
      service.method = method,
      user.id = user_id.as_deref(),
      game.id = game_id.as_deref(),
      error = %e,
      "request failed"
    );
  }
}

// ─── Storefront ──────────────────────────────────────────────────────────────

/// Commerce engine over a [`LedgerStore`] and a [`NotificationSender`].
pub struct Storefront<S> {
  store:  Arc<S>,
  sender: Arc<dyn NotificationSender>,
  config: CommerceConfig,
}

impl<S> Clone for Storefront<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      sender: Arc::clone(&self.sender),
      config: self.config,
    }
  }
}

impl<S: LedgerStore> Storefront<S> {
  pub fn new(
    store: Arc<S>,
    sender: Arc<dyn NotificationSender>,
    config: CommerceConfig,
  ) -> Result<Self> {
    config.validate()?;
    Ok(Self { store, sender, config })
  }

  pub fn config(&self) -> &CommerceConfig { &self.config }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Identity ──────────────────────────────────────────────────────────

  pub async fn register_user(&self, input: NewUser) -> Result<User> {
    input.validate()?;
    self
      .store
      .read_write(move |tx| tx.create_user(&input))
      .await
      .inspect_err(|e| log_failure("register_user", None, None, e))
  }

  pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
    self
      .store
      .read_only(move |tx| tx.get_user(user_id)?.ok_or(Error::UserNotFound(user_id)))
      .await
      .inspect_err(|e| log_failure("get_user", Some(user_id), None, e))
  }

  /// Update profile fields of a user. The balance is never touched.
  pub async fn patch_user(&self, user_id: Uuid, patch: UserPatch) -> Result<User> {
    patch
      .validate()
      .inspect_err(|e| log_failure("patch_user", Some(user_id), None, e))?;
    self
      .store
      .read_write(move |tx| tx.patch_user(user_id, &patch))
      .await
      .inspect_err(|e| log_failure("patch_user", Some(user_id), None, e))
  }

  // ── Catalog ───────────────────────────────────────────────────────────

  pub async fn create_publisher(&self, input: NewPublisher) -> Result<Publisher> {
    self
      .store
      .read_write(move |tx| tx.create_publisher(&input))
      .await
      .inspect_err(|e| log_failure("create_publisher", None, None, e))
  }

  pub async fn get_publisher(&self, publisher_id: Uuid) -> Result<Publisher> {
    self
      .store
      .read_only(move |tx| {
        tx.get_publisher(publisher_id)?
          .ok_or(Error::PublisherNotFound(publisher_id))
      })
      .await
      .inspect_err(|e| log_failure("get_publisher", None, None, e))
  }

  pub async fn patch_publisher(
    &self,
    publisher_id: Uuid,
    patch: PublisherPatch,
  ) -> Result<Publisher> {
    patch
      .validate()
      .inspect_err(|e| log_failure("patch_publisher", None, None, e))?;
    self
      .store
      .read_write(move |tx| tx.patch_publisher(publisher_id, &patch))
      .await
      .inspect_err(|e| log_failure("patch_publisher", None, None, e))
  }

  pub async fn create_game(&self, input: NewGame) -> Result<Game> {
    input.validate()?;
    self
      .store
      .read_write(move |tx| {
        if tx.get_publisher(input.publisher_id)?.is_none() {
          return Err(Error::PublisherNotFound(input.publisher_id));
        }
        tx.create_game(&input)
      })
      .await
      .inspect_err(|e| log_failure("create_game", None, None, e))
  }

  pub async fn get_game(&self, game_id: Uuid) -> Result<Game> {
    self
      .store
      .read_only(move |tx| tx.get_game(game_id)?.ok_or(Error::GameNotFound(game_id)))
      .await
      .inspect_err(|e| log_failure("get_game", None, Some(game_id), e))
  }

  /// Update catalog fields of a game. Carts already holding the game are
  /// re-checked at purchase time.
  pub async fn patch_game(&self, game_id: Uuid, patch: GamePatch) -> Result<Game> {
    patch
      .validate()
      .inspect_err(|e| log_failure("patch_game", None, Some(game_id), e))?;
    self
      .store
      .read_write(move |tx| tx.patch_game(game_id, &patch))
      .await
      .inspect_err(|e| log_failure("patch_game", None, Some(game_id), e))
  }

  // ── Cart ──────────────────────────────────────────────────────────────

  /// Add a game to a user's cart after the eligibility checks.
  pub async fn add_to_cart(
    &self,
    user_id: Uuid,
    game_id: Uuid,
    cancel: &CancellationToken,
  ) -> Result<()> {
    let cancel = cancel.clone();
    self
      .store
      .read_write(move |tx| {
        eligibility::add_to_cart(tx, user_id, game_id, Utc::now())?;
        if cancel.is_cancelled() {
          return Err(Error::Cancelled);
        }
        Ok(())
      })
      .await
      .inspect_err(|e| log_failure("add_to_cart", Some(user_id), Some(game_id), e))
  }

  pub async fn remove_from_cart(&self, user_id: Uuid, game_id: Uuid) -> Result<()> {
    self
      .store
      .read_write(move |tx| tx.delete_cart_entry(user_id, game_id))
      .await
      .inspect_err(|e| log_failure("remove_from_cart", Some(user_id), Some(game_id), e))
  }

  pub async fn list_cart(
    &self,
    user_id: Uuid,
    page: PageRequest<CartSort>,
  ) -> Result<Page<CartItem>> {
    page
      .validate()
      .inspect_err(|e| log_failure("list_cart", Some(user_id), None, e))?;
    self
      .store
      .read_only(move |tx| tx.list_cart(user_id, &page))
      .await
      .inspect_err(|e| log_failure("list_cart", Some(user_id), None, e))
  }

  // ── Library ───────────────────────────────────────────────────────────

  pub async fn list_library(
    &self,
    user_id: Uuid,
    page: PageRequest<LibrarySort>,
  ) -> Result<Page<LibraryItem>> {
    page
      .validate()
      .inspect_err(|e| log_failure("list_library", Some(user_id), None, e))?;
    self
      .store
      .read_only(move |tx| tx.list_library(user_id, &page))
      .await
      .inspect_err(|e| log_failure("list_library", Some(user_id), None, e))
  }

  // ── Purchase ──────────────────────────────────────────────────────────

  /// Buy everything in the user's cart.
  ///
  /// Debits the balance by the tax-inclusive total, moves the cart into the
  /// library, records the invoice and emails it, all in one transaction.
  /// Cancelling `cancel` before the commit rolls everything back.
  pub async fn purchase(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<Invoice> {
    let request = PurchaseRequest {
      user_id,
      tax_rate: self.config.tax_rate,
      drain_batch: self.config.drain_batch,
      now: Utc::now(),
    };
    let sender = Arc::clone(&self.sender);
    let cancel = cancel.clone();

    let invoice = self
      .store
      .read_write(move |tx| purchase::run(tx, &request, sender.as_ref(), &cancel))
      .await
      .inspect_err(|e| log_failure("purchase", Some(user_id), None, e))?;

    tracing::info!(
      user.id = %user_id,
      invoice.id = %invoice.invoice_id,
      lines = invoice.lines.len(),
      "cart purchased"
    );
    Ok(invoice)
  }

  pub async fn list_invoices(&self, user_id: Uuid) -> Result<Vec<Invoice>> {
    self
      .store
      .read_only(move |tx| tx.list_invoices(user_id))
      .await
      .inspect_err(|e| log_failure("list_invoices", Some(user_id), None, e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn drain_batch_must_fit_a_page() {
    let mut config = CommerceConfig::default();
    assert!(config.validate().is_ok());

    config.drain_batch = 0;
    assert!(config.validate().is_err());

    config.drain_batch = MAX_LIMIT + 1;
    assert!(config.validate().is_err());
  }
}
