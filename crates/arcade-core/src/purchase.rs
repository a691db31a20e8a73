//! The purchase workflow: cart → library, balance debit, invoice.
//!
//! [`run`] is the body of a single read-write transaction. It writes nothing
//! until every check has passed, and any error it returns makes the caller's
//! transaction roll back, so a purchase is applied completely or not at all.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
  Error, Result,
  cart::{CartItem, CartSort},
  eligibility,
  invoice::{INVOICE_EMAIL_SUBJECT, Invoice, InvoiceNotice},
  money::{TaxRate, Totals},
  notify::NotificationSender,
  page::{Order, PageRequest},
  store::LedgerTx,
};

/// Inputs of one purchase.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
  pub user_id:     Uuid,
  pub tax_rate:    TaxRate,
  /// Cart entries fetched per page while draining.
  pub drain_batch: u32,
  pub now:         DateTime<Utc>,
}

/// The drained content of a cart.
#[derive(Debug, Clone)]
pub struct Drain {
  pub items:   Vec<CartItem>,
  /// Number of page queries issued.
  pub batches: usize,
}

fn ensure_live(cancel: &CancellationToken) -> Result<()> {
  if cancel.is_cancelled() {
    return Err(Error::Cancelled);
  }
  Ok(())
}

/// Page through the user's whole cart, newest first.
///
/// Stops at the first short page. The entries must add up to the total the
/// first page reported and must be distinct; anything else means the cart
/// changed under the transaction.
pub fn drain_cart(
  tx: &dyn LedgerTx,
  user_id: Uuid,
  batch: u32,
  cancel: &CancellationToken,
) -> Result<Drain> {
  if batch == 0 {
    return Err(Error::InvalidField("drain_batch"));
  }

  let mut items: Vec<CartItem> = Vec::new();
  let mut expected = None;
  let mut batches = 0;

  loop {
    ensure_live(cancel)?;

    let offset = u32::try_from(items.len())
      .map_err(|_| Error::InvariantViolation("cart exceeds addressable size".into()))?;
    let page = tx.list_cart(
      user_id,
      &PageRequest::new(CartSort::CreatedAt, Order::Desc, batch, offset),
    )?;
    batches += 1;

    let expected = *expected.get_or_insert(page.total);
    let fetched = page.results.len();
    items.extend(page.results);

    if fetched < batch as usize || items.len() as u64 >= expected {
      break;
    }
  }

  let total = expected.unwrap_or(0);
  if items.len() as u64 != total {
    return Err(Error::InvariantViolation(format!(
      "drained {} cart entries, expected {total}",
      items.len()
    )));
  }

  let mut seen = HashSet::with_capacity(items.len());
  if let Some(dup) = items.iter().find(|i| !seen.insert(i.game.game_id)) {
    return Err(Error::InvariantViolation(format!(
      "cart entry for game {} drained twice",
      dup.game.game_id
    )));
  }

  Ok(Drain { items, batches })
}

/// Execute the purchase inside `tx`.
pub fn run(
  tx: &dyn LedgerTx,
  request: &PurchaseRequest,
  sender: &dyn NotificationSender,
  cancel: &CancellationToken,
) -> Result<Invoice> {
  let user_id = request.user_id;
  let user = tx.get_user(user_id)?.ok_or(Error::UserNotFound(user_id))?;

  let drain = drain_cart(tx, user_id, request.drain_batch, cancel)?;
  if drain.items.is_empty() {
    return Err(Error::UserCartEmpty(user_id));
  }

  for item in &drain.items {
    eligibility::check_purchasable(item, request.now)?;
  }

  let totals = Totals::compute(drain.items.iter().map(|i| i.game.price), request.tax_rate)?;
  let new_balance = user
    .balance
    .checked_sub(totals.total)
    .ok_or(Error::AmountOutOfRange)?;
  if new_balance < Decimal::ZERO {
    return Err(Error::UserBalanceInsufficient(user_id));
  }

  ensure_live(cancel)?;

  tx.set_balance(user_id, new_balance)?;

  let invoice = Invoice::draft(&user, &drain.items, request.tax_rate, request.now)?;
  tx.purchase_cart(&invoice)?;

  tracing::debug!(
    user.id = %user_id,
    games = drain.items.len(),
    batches = drain.batches,
    total = %totals.total,
    "cart migrated to library"
  );

  ensure_live(cancel)?;

  let body = InvoiceNotice::new(&user, &drain.items, &totals, request.tax_rate, request.now)?
    .render_html();
  sender
    .send_invoice_email(&user.email, INVOICE_EMAIL_SUBJECT, &body)
    .map_err(Error::Notification)?;

  ensure_live(cancel)?;

  Ok(invoice)
}
