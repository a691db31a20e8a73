//! Invoices and the purchase notification rendered from them.
//!
//! Invoices are append-only. Every line snapshots the price, the tax share and
//! the publisher's tax identity at purchase time, so later catalog edits never
//! change a historical invoice.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  cart::CartItem,
  money::{TaxRate, Totals, checked_sum, format_amount},
  user::{TaxIdentity, User},
};

/// Subject line of the invoice email.
pub const INVOICE_EMAIL_SUBJECT: &str = "Arcade Store Invoice";

// ─── Stored invoice ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
  pub game_id:       Uuid,
  pub price:         Decimal,
  pub tax:           Decimal,
  pub publisher_tax: TaxIdentity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub invoice_id: Uuid,
  pub user_id:    Uuid,
  pub user_tax:   TaxIdentity,
  pub created_at: DateTime<Utc>,
  pub lines:      Vec<InvoiceLine>,
}

impl Invoice {
  /// Build the invoice for `items` bought by `user` at `now`.
  pub fn draft(
    user: &User,
    items: &[CartItem],
    rate: TaxRate,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    let lines = items
      .iter()
      .map(|item| {
        Ok(InvoiceLine {
          game_id:       item.game.game_id,
          price:         item.game.price,
          tax:           rate.tax_on(item.game.price)?,
          publisher_tax: item.publisher_tax.clone(),
        })
      })
      .collect::<Result<_>>()?;

    Ok(Self {
      invoice_id: Uuid::new_v4(),
      user_id:    user.user_id,
      user_tax:   user.tax.clone(),
      created_at: now,
      lines,
    })
  }

  pub fn subtotal(&self) -> Result<Decimal> { checked_sum(self.lines.iter().map(|l| l.price)) }

  pub fn tax(&self) -> Result<Decimal> { checked_sum(self.lines.iter().map(|l| l.tax)) }

  pub fn total(&self) -> Result<Decimal> {
    self
      .subtotal()?
      .checked_add(self.tax()?)
      .ok_or(Error::AmountOutOfRange)
  }
}

// ─── Notification model ──────────────────────────────────────────────────────

/// One row of the invoice email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticeLine {
  pub title:          String,
  /// Price including tax.
  pub price_with_tax: Decimal,
}

/// Everything the invoice email shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceNotice {
  pub display_name: String,
  pub email:        String,
  pub user_tax:     TaxIdentity,
  pub lines:        Vec<NoticeLine>,
  pub subtotal:     Decimal,
  /// Whole percentage, e.g. `"23"`.
  pub tax_percent:  String,
  pub tax:          Decimal,
  pub total:        Decimal,
  /// ISO date (`YYYY-MM-DD`).
  pub purchased_on: String,
}

impl InvoiceNotice {
  pub fn new(
    user: &User,
    items: &[CartItem],
    totals: &Totals,
    rate: TaxRate,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    let lines = items
      .iter()
      .map(|item| {
        Ok(NoticeLine {
          title:          item.game.title.clone(),
          price_with_tax: rate.with_tax(item.game.price)?,
        })
      })
      .collect::<Result<_>>()?;

    Ok(Self {
      display_name: user.display_name.clone(),
      email:        user.email.clone(),
      user_tax:     user.tax.clone(),
      lines,
      subtotal:     totals.subtotal,
      tax_percent:  rate.percent_string(),
      tax:          totals.tax,
      total:        totals.total,
      purchased_on: now.date_naive().format("%Y-%m-%d").to_string(),
    })
  }

  /// Render the HTML email body.
  pub fn render_html(&self) -> String {
    let mut rows = String::new();
    for line in &self.lines {
      // Writing into a String cannot fail.
      let _ = write!(
        rows,
        "<tr><td>{}</td><td align=\"right\">{}</td></tr>",
        escape_html(&line.title),
        format_amount(line.price_with_tax),
      );
    }

    format!(
      "<!DOCTYPE html>\
<html><body>\
<h1>Invoice</h1>\
<p>{name} &lt;{email}&gt;<br>{country} {vatin}</p>\
<p>Date: {date}</p>\
<table>{rows}</table>\
<table>\
<tr><td>Subtotal</td><td align=\"right\">{subtotal}</td></tr>\
<tr><td>Tax ({percent}%)</td><td align=\"right\">{tax}</td></tr>\
<tr><td><b>Total</b></td><td align=\"right\"><b>{total}</b></td></tr>\
</table>\
</body></html>",
      name = escape_html(&self.display_name),
      email = escape_html(&self.email),
      country = escape_html(&self.user_tax.country),
      vatin = escape_html(&self.user_tax.vatin),
      date = self.purchased_on,
      subtotal = format_amount(self.subtotal),
      percent = self.tax_percent,
      tax = format_amount(self.tax),
      total = format_amount(self.total),
    )
  }
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone};

  use super::*;
  use crate::game::{AgeRating, Game};

  fn user() -> User {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    User {
      user_id:       Uuid::new_v4(),
      username:      "ada".into(),
      email:         "ada@example.com".into(),
      display_name:  "Ada <Lovelace>".into(),
      date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
      tax:           TaxIdentity { country: "PT".into(), vatin: "111".into() },
      balance:       Decimal::new(30, 0),
      created_at:    at,
      modified_at:   at,
    }
  }

  fn item(title: &str, price: Decimal) -> CartItem {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    CartItem {
      game:          Game {
        game_id:      Uuid::new_v4(),
        publisher_id: Uuid::new_v4(),
        title:        title.into(),
        price,
        is_active:    true,
        release_date: Some(at),
        age_rating:   AgeRating::from("3"),
        created_at:   at,
        modified_at:  at,
      },
      publisher_tax: TaxIdentity { country: "FR".into(), vatin: "999".into() },
      added_at:      at,
    }
  }

  #[test]
  fn draft_snapshots_line_prices_and_tax_shares() {
    let items = [item("a", Decimal::new(500, 2)), item("b", Decimal::new(1500, 2))];
    let now = Utc::now();
    let invoice = Invoice::draft(&user(), &items, TaxRate::default(), now).unwrap();

    assert_eq!(invoice.lines.len(), 2);
    assert_eq!(invoice.lines[0].tax, Decimal::new(115, 2));
    assert_eq!(invoice.lines[1].tax, Decimal::new(345, 2));
    assert_eq!(invoice.lines[1].publisher_tax.vatin, "999");
    assert_eq!(invoice.subtotal().unwrap(), Decimal::new(20, 0));
    assert_eq!(invoice.total().unwrap(), Decimal::new(246, 1));
  }

  #[test]
  fn notice_refuses_a_line_whose_taxed_price_overflows() {
    let items = [item("a", Decimal::MAX)];
    let rate = TaxRate::new(Decimal::new(99, 2)).unwrap();
    let notice = InvoiceNotice::new(&user(), &items, &Totals::default(), rate, Utc::now());
    assert!(matches!(notice, Err(Error::AmountOutOfRange)));
  }

  #[test]
  fn notice_renders_tax_inclusive_lines_and_totals() {
    let items = [item("Tetris & Co", Decimal::new(500, 2)), item("b", Decimal::new(1500, 2))];
    let rate = TaxRate::default();
    let totals = Totals::compute(items.iter().map(|i| i.game.price), rate).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();

    let notice = InvoiceNotice::new(&user(), &items, &totals, rate, now).unwrap();
    assert_eq!(notice.tax_percent, "23");
    assert_eq!(notice.purchased_on, "2026-10-18");

    let html = notice.render_html();
    assert!(html.contains("Tetris &amp; Co"));
    assert!(html.contains("Ada &lt;Lovelace&gt;"));
    assert!(html.contains("6.15"));
    assert!(html.contains("18.45"));
    assert!(html.contains("Tax (23%)"));
    assert!(html.contains("24.60"));
    assert!(html.contains("2026-10-18"));
  }
}
