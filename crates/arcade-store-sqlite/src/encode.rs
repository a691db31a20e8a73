//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with fixed nanosecond precision so they
//! sort lexically. Calendar dates are `YYYY-MM-DD`. Money is a decimal string.
//! UUIDs are hyphenated lowercase strings.

use std::str::FromStr as _;

use arcade_core::{
  game::{AgeRating, Game, Publisher},
  invoice::{Invoice, InvoiceLine},
  user::{TaxIdentity, User},
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for a user, in [`RawUser::from_row`] order.
pub const USER_COLUMNS: &str = "u.user_id, u.username, u.email, u.display_name, \
   u.date_of_birth, u.country, u.vatin, u.balance, u.created_at, u.modified_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub display_name:  String,
  pub date_of_birth: String,
  pub country:       String,
  pub vatin:         String,
  pub balance:       String,
  pub created_at:    String,
  pub modified_at:   String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      display_name:  row.get(3)?,
      date_of_birth: row.get(4)?,
      country:       row.get(5)?,
      vatin:         row.get(6)?,
      balance:       row.get(7)?,
      created_at:    row.get(8)?,
      modified_at:   row.get(9)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      email:         self.email,
      display_name:  self.display_name,
      date_of_birth: decode_date(&self.date_of_birth)?,
      tax:           TaxIdentity { country: self.country, vatin: self.vatin },
      balance:       decode_decimal(&self.balance)?,
      created_at:    decode_dt(&self.created_at)?,
      modified_at:   decode_dt(&self.modified_at)?,
    })
  }
}

/// Columns selected for a publisher, in [`RawPublisher::from_row`] order.
pub const PUBLISHER_COLUMNS: &str =
  "p.publisher_id, p.email, p.name, p.country, p.vatin, p.created_at";

/// Raw strings read directly from a `publishers` row.
pub struct RawPublisher {
  pub publisher_id: String,
  pub email:        String,
  pub name:         String,
  pub country:      String,
  pub vatin:        String,
  pub created_at:   String,
}

impl RawPublisher {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      publisher_id: row.get(0)?,
      email:        row.get(1)?,
      name:         row.get(2)?,
      country:      row.get(3)?,
      vatin:        row.get(4)?,
      created_at:   row.get(5)?,
    })
  }

  pub fn into_publisher(self) -> Result<Publisher> {
    Ok(Publisher {
      publisher_id: decode_uuid(&self.publisher_id)?,
      email:        self.email,
      name:         self.name,
      tax:          TaxIdentity { country: self.country, vatin: self.vatin },
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Columns selected for a game, in [`RawGame::from_row`] order.
pub const GAME_COLUMNS: &str = "g.game_id, g.publisher_id, g.title, g.price, \
   g.is_active, g.release_date, g.age_rating, g.created_at, g.modified_at";

/// Number of entries in [`GAME_COLUMNS`].
pub const GAME_COLUMN_COUNT: usize = 9;

/// Raw values read directly from a `games` row.
pub struct RawGame {
  pub game_id:      String,
  pub publisher_id: String,
  pub title:        String,
  pub price:        String,
  pub is_active:    bool,
  pub release_date: Option<String>,
  pub age_rating:   String,
  pub created_at:   String,
  pub modified_at:  String,
}

impl RawGame {
  /// Read the game columns starting at `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      game_id:      row.get(offset)?,
      publisher_id: row.get(offset + 1)?,
      title:        row.get(offset + 2)?,
      price:        row.get(offset + 3)?,
      is_active:    row.get(offset + 4)?,
      release_date: row.get(offset + 5)?,
      age_rating:   row.get(offset + 6)?,
      created_at:   row.get(offset + 7)?,
      modified_at:  row.get(offset + 8)?,
    })
  }

  pub fn into_game(self) -> Result<Game> {
    Ok(Game {
      game_id:      decode_uuid(&self.game_id)?,
      publisher_id: decode_uuid(&self.publisher_id)?,
      title:        self.title,
      price:        decode_decimal(&self.price)?,
      is_active:    self.is_active,
      release_date: self.release_date.as_deref().map(decode_dt).transpose()?,
      age_rating:   AgeRating(self.age_rating),
      created_at:   decode_dt(&self.created_at)?,
      modified_at:  decode_dt(&self.modified_at)?,
    })
  }
}

/// Raw strings read from an `invoices` row.
pub struct RawInvoice {
  pub invoice_id:   String,
  pub user_id:      String,
  pub user_country: String,
  pub user_vatin:   String,
  pub created_at:   String,
}

impl RawInvoice {
  pub fn into_invoice(self, lines: Vec<InvoiceLine>) -> Result<Invoice> {
    Ok(Invoice {
      invoice_id: decode_uuid(&self.invoice_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      user_tax:   TaxIdentity { country: self.user_country, vatin: self.user_vatin },
      created_at: decode_dt(&self.created_at)?,
      lines,
    })
  }
}

/// Raw strings read from an `invoice_lines` row.
pub struct RawInvoiceLine {
  pub invoice_id:        String,
  pub game_id:           String,
  pub price:             String,
  pub tax:               String,
  pub publisher_country: String,
  pub publisher_vatin:   String,
}

impl RawInvoiceLine {
  pub fn into_line(self) -> Result<(Uuid, InvoiceLine)> {
    Ok((decode_uuid(&self.invoice_id)?, InvoiceLine {
      game_id:       decode_uuid(&self.game_id)?,
      price:         decode_decimal(&self.price)?,
      tax:           decode_decimal(&self.tax)?,
      publisher_tax: TaxIdentity {
        country: self.publisher_country,
        vatin:   self.publisher_vatin,
      },
    }))
  }
}
