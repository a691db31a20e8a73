//! [`SqliteTx`]: the SQLite implementation of [`LedgerTx`].
//!
//! Every constraint failure is translated into the matching
//! [`arcade_core::Error`] here; nothing above this layer sees a raw SQLite
//! error code.

use std::collections::HashMap;

use arcade_core::{
  Error, Result,
  cart::{CartItem, CartSort, LibraryItem, LibrarySort},
  game::{Game, GamePatch, NewGame, NewPublisher, Publisher, PublisherPatch},
  invoice::{Invoice, InvoiceLine},
  page::{Page, PageRequest},
  store::LedgerTx,
  user::{NewUser, TaxIdentity, User, UserPatch},
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, ffi, params};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::encode::{
  GAME_COLUMN_COUNT, GAME_COLUMNS, PUBLISHER_COLUMNS, RawGame, RawInvoice,
  RawInvoiceLine, RawPublisher, RawUser, USER_COLUMNS, decode_dt, encode_date,
  encode_decimal, encode_dt, encode_uuid,
};

// ─── Error mapping ───────────────────────────────────────────────────────────

/// Converts backend results into [`arcade_core::Result`].
trait IntoCore<T> {
  fn core(self) -> Result<T>;
}

impl<T, E: Into<crate::Error>> IntoCore<T> for std::result::Result<T, E> {
  fn core(self) -> Result<T> { self.map_err(storage) }
}

fn storage(e: impl Into<crate::Error>) -> Error {
  let e: crate::Error = e.into();
  Error::storage(e)
}

/// The kind of constraint a failed statement tripped over.
enum Violation {
  /// Carries the field named in SQLite's message.
  Unique(&'static str),
  PrimaryKey,
  ForeignKey,
  Check,
}

fn violation(e: &rusqlite::Error) -> Option<Violation> {
  let rusqlite::Error::SqliteFailure(err, msg) = e else {
    return None;
  };
  match err.extended_code {
    ffi::SQLITE_CONSTRAINT_UNIQUE => {
      let msg = msg.as_deref().unwrap_or_default();
      let target = msg.rsplit(": ").next().unwrap_or_default();
      Some(Violation::Unique(unique_field(target)))
    }
    ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Some(Violation::PrimaryKey),
    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
    ffi::SQLITE_CONSTRAINT_CHECK => Some(Violation::Check),
    _ => None,
  }
}

/// Map `users.email`-style targets to the field name reported to callers.
fn unique_field(target: &str) -> &'static str {
  // Composite targets list every column; the last one decides.
  match target.rsplit('.').next().unwrap_or_default() {
    "username" => "username",
    "email" => "email",
    "vatin" => "vatin",
    _ => "record",
  }
}

// ─── Transaction handle ──────────────────────────────────────────────────────

/// A borrowed view of an open SQLite transaction.
pub(crate) struct SqliteTx<'c> {
  conn:     &'c Connection,
  writable: bool,
}

impl<'c> SqliteTx<'c> {
  pub(crate) fn new(conn: &'c Connection, writable: bool) -> Self {
    Self { conn, writable }
  }

  fn ensure_writable(&self, op: &str) -> Result<()> {
    if self.writable {
      return Ok(());
    }
    Err(Error::InvariantViolation(format!("{op} inside a read-only transaction")))
  }

  fn exists(&self, sql: &str, id: Uuid) -> Result<bool> {
    self
      .conn
      .query_row(sql, params![encode_uuid(id)], |_| Ok(()))
      .optional()
      .core()
      .map(|row| row.is_some())
  }

  /// Work out which side of a `(user, game)` foreign key is dangling.
  fn missing_reference(&self, user_id: Uuid, game_id: Uuid, e: rusqlite::Error) -> Error {
    match self.exists("SELECT 1 FROM users WHERE user_id = ?1", user_id) {
      Ok(false) => return Error::UserNotFound(user_id),
      Err(probe) => return probe,
      Ok(true) => {}
    }
    match self.exists("SELECT 1 FROM games WHERE game_id = ?1", game_id) {
      Ok(false) => Error::GameNotFound(game_id),
      Err(probe) => probe,
      Ok(true) => storage(e),
    }
  }

  fn count(&self, sql: &str, user_id: Uuid) -> Result<u64> {
    let n: i64 = self
      .conn
      .query_row(sql, params![encode_uuid(user_id)], |r| r.get(0))
      .core()?;
    Ok(u64::try_from(n).unwrap_or_default())
  }

  fn insert_library_entries(&self, invoice: &Invoice) -> Result<()> {
    let user_str = encode_uuid(invoice.user_id);
    let at_str = encode_dt(invoice.created_at);
    let mut stmt = self
      .conn
      .prepare_cached(
        "INSERT INTO users_libraries (user_id, game_id, created_at) VALUES (?1, ?2, ?3)",
      )
      .core()?;
    for line in &invoice.lines {
      stmt
        .execute(params![user_str, encode_uuid(line.game_id), at_str])
        .map_err(|e| match violation(&e) {
          Some(Violation::PrimaryKey) => Error::UserLibraryGameAlreadyExists {
            user_id: invoice.user_id,
            game_id: line.game_id,
          },
          Some(Violation::ForeignKey) => {
            self.missing_reference(invoice.user_id, line.game_id, e)
          }
          _ => storage(e),
        })?;
    }
    Ok(())
  }

  fn insert_invoice(&self, invoice: &Invoice) -> Result<()> {
    let invoice_str = encode_uuid(invoice.invoice_id);
    self
      .conn
      .execute(
        "INSERT INTO invoices (invoice_id, user_id, user_country, user_vatin, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
          invoice_str,
          encode_uuid(invoice.user_id),
          invoice.user_tax.country,
          invoice.user_tax.vatin,
          encode_dt(invoice.created_at),
        ],
      )
      .core()?;

    let mut stmt = self
      .conn
      .prepare_cached(
        "INSERT INTO invoice_lines
           (invoice_id, position, game_id, price, tax, publisher_country, publisher_vatin)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      )
      .core()?;
    for (position, line) in invoice.lines.iter().enumerate() {
      let position = i64::try_from(position).core_with("invoice line position")?;
      stmt
        .execute(params![
          invoice_str,
          position,
          encode_uuid(line.game_id),
          encode_decimal(line.price),
          encode_decimal(line.tax),
          line.publisher_tax.country,
          line.publisher_tax.vatin,
        ])
        .map_err(|e| match violation(&e) {
          Some(Violation::Unique(_)) => Error::InvariantViolation(format!(
            "game {} appears twice on invoice {}",
            line.game_id, invoice.invoice_id
          )),
          _ => storage(e),
        })?;
    }
    Ok(())
  }
}

/// Conversion failures that indicate a bug rather than bad data.
trait CoreWith<T> {
  fn core_with(self, what: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> CoreWith<T> for std::result::Result<T, E> {
  fn core_with(self, what: &str) -> Result<T> {
    self.map_err(|e| Error::InvariantViolation(format!("{what}: {e}")))
  }
}

// ─── LedgerTx ────────────────────────────────────────────────────────────────

impl LedgerTx for SqliteTx<'_> {
  // ── Identity ──────────────────────────────────────────────────────────

  fn create_user(&self, input: &NewUser) -> Result<User> {
    self.ensure_writable("create_user")?;
    let now = Utc::now();
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username.clone(),
      email:         input.email.clone(),
      display_name:  input.display_name.clone(),
      date_of_birth: input.date_of_birth,
      tax:           input.tax.clone(),
      balance:       input.balance,
      created_at:    now,
      modified_at:   now,
    };

    self
      .conn
      .execute(
        "INSERT INTO users
           (user_id, username, email, display_name, date_of_birth,
            country, vatin, balance, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
          encode_uuid(user.user_id),
          user.username,
          user.email,
          user.display_name,
          encode_date(user.date_of_birth),
          user.tax.country,
          user.tax.vatin,
          encode_decimal(user.balance),
          encode_dt(now),
          encode_dt(now),
        ],
      )
      .map_err(|e| match violation(&e) {
        Some(Violation::Unique(field)) => Error::AlreadyExists(field),
        Some(Violation::Check) => Error::InvalidField("balance"),
        _ => storage(e),
      })?;

    Ok(user)
  }

  fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
        params![encode_uuid(user_id)],
        RawUser::from_row,
      )
      .optional()
      .core()?;
    raw.map(RawUser::into_user).transpose().core()
  }

  fn patch_user(&self, user_id: Uuid, patch: &UserPatch) -> Result<User> {
    self.ensure_writable("patch_user")?;
    let changed = self
      .conn
      .execute(
        "UPDATE users SET
           username      = coalesce(?2, username),
           email         = coalesce(?3, email),
           display_name  = coalesce(?4, display_name),
           date_of_birth = coalesce(?5, date_of_birth),
           country       = coalesce(?6, country),
           vatin         = coalesce(?7, vatin),
           modified_at   = ?8
         WHERE user_id = ?1",
        params![
          encode_uuid(user_id),
          patch.username,
          patch.email,
          patch.display_name,
          patch.date_of_birth.map(encode_date),
          patch.country,
          patch.vatin,
          encode_dt(Utc::now()),
        ],
      )
      .map_err(|e| match violation(&e) {
        Some(Violation::Unique(field)) => Error::AlreadyExists(field),
        _ => storage(e),
      })?;
    if changed == 0 {
      return Err(Error::UserNotFound(user_id));
    }
    self.get_user(user_id)?.ok_or(Error::UserNotFound(user_id))
  }

  fn set_balance(&self, user_id: Uuid, balance: Decimal) -> Result<()> {
    self.ensure_writable("set_balance")?;
    let changed = self
      .conn
      .execute(
        "UPDATE users SET balance = ?2, modified_at = ?3 WHERE user_id = ?1",
        params![encode_uuid(user_id), encode_decimal(balance), encode_dt(Utc::now())],
      )
      .map_err(|e| match violation(&e) {
        Some(Violation::Check) => Error::UserBalanceInsufficient(user_id),
        _ => storage(e),
      })?;
    if changed == 0 {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  // ── Catalog ───────────────────────────────────────────────────────────

  fn create_publisher(&self, input: &NewPublisher) -> Result<Publisher> {
    self.ensure_writable("create_publisher")?;
    let publisher = Publisher {
      publisher_id: Uuid::new_v4(),
      email:        input.email.clone(),
      name:         input.name.clone(),
      tax:          input.tax.clone(),
      created_at:   Utc::now(),
    };

    self
      .conn
      .execute(
        "INSERT INTO publishers (publisher_id, email, name, country, vatin, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
          encode_uuid(publisher.publisher_id),
          publisher.email,
          publisher.name,
          publisher.tax.country,
          publisher.tax.vatin,
          encode_dt(publisher.created_at),
        ],
      )
      .map_err(|e| match violation(&e) {
        Some(Violation::Unique(field)) => Error::AlreadyExists(field),
        _ => storage(e),
      })?;

    Ok(publisher)
  }

  fn get_publisher(&self, publisher_id: Uuid) -> Result<Option<Publisher>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {PUBLISHER_COLUMNS} FROM publishers p WHERE p.publisher_id = ?1"),
        params![encode_uuid(publisher_id)],
        RawPublisher::from_row,
      )
      .optional()
      .core()?;
    raw.map(RawPublisher::into_publisher).transpose().core()
  }

  fn patch_publisher(&self, publisher_id: Uuid, patch: &PublisherPatch) -> Result<Publisher> {
    self.ensure_writable("patch_publisher")?;
    let changed = self
      .conn
      .execute(
        "UPDATE publishers SET
           email   = coalesce(?2, email),
           name    = coalesce(?3, name),
           country = coalesce(?4, country),
           vatin   = coalesce(?5, vatin)
         WHERE publisher_id = ?1",
        params![encode_uuid(publisher_id), patch.email, patch.name, patch.country, patch.vatin],
      )
      .map_err(|e| match violation(&e) {
        Some(Violation::Unique(field)) => Error::AlreadyExists(field),
        _ => storage(e),
      })?;
    if changed == 0 {
      return Err(Error::PublisherNotFound(publisher_id));
    }
    self
      .get_publisher(publisher_id)?
      .ok_or(Error::PublisherNotFound(publisher_id))
  }

  fn create_game(&self, input: &NewGame) -> Result<Game> {
    self.ensure_writable("create_game")?;
    let now = Utc::now();
    let game = Game {
      game_id:      Uuid::new_v4(),
      publisher_id: input.publisher_id,
      title:        input.title.clone(),
      price:        input.price,
      is_active:    input.is_active,
      release_date: input.release_date,
      age_rating:   input.age_rating.clone(),
      created_at:   now,
      modified_at:  now,
    };

    self
      .conn
      .execute(
        "INSERT INTO games
           (game_id, publisher_id, title, price, is_active, release_date,
            age_rating, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
          encode_uuid(game.game_id),
          encode_uuid(game.publisher_id),
          game.title,
          encode_decimal(game.price),
          game.is_active,
          game.release_date.map(encode_dt),
          game.age_rating.0,
          encode_dt(now),
          encode_dt(now),
        ],
      )
      .map_err(|e| match violation(&e) {
        Some(Violation::ForeignKey) => Error::PublisherNotFound(input.publisher_id),
        Some(Violation::Check) => Error::InvalidField("price"),
        _ => storage(e),
      })?;

    Ok(game)
  }

  fn get_game(&self, game_id: Uuid) -> Result<Option<Game>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {GAME_COLUMNS} FROM games g WHERE g.game_id = ?1"),
        params![encode_uuid(game_id)],
        |row| RawGame::from_row(row, 0),
      )
      .optional()
      .core()?;
    raw.map(RawGame::into_game).transpose().core()
  }

  fn patch_game(&self, game_id: Uuid, patch: &GamePatch) -> Result<Game> {
    self.ensure_writable("patch_game")?;
    let changed = self
      .conn
      .execute(
        "UPDATE games SET
           title        = coalesce(?2, title),
           price        = coalesce(?3, price),
           is_active    = coalesce(?4, is_active),
           release_date = coalesce(?5, release_date),
           age_rating   = coalesce(?6, age_rating),
           modified_at  = ?7
         WHERE game_id = ?1",
        params![
          encode_uuid(game_id),
          patch.title,
          patch.price.map(encode_decimal),
          patch.is_active,
          patch.release_date.map(encode_dt),
          patch.age_rating.as_ref().map(|r| r.0.as_str()),
          encode_dt(Utc::now()),
        ],
      )
      .map_err(|e| match violation(&e) {
        Some(Violation::Check) => Error::InvalidField("price"),
        _ => storage(e),
      })?;
    if changed == 0 {
      return Err(Error::GameNotFound(game_id));
    }
    self.get_game(game_id)?.ok_or(Error::GameNotFound(game_id))
  }

  // ── Cart ──────────────────────────────────────────────────────────────

  fn insert_cart_entry(&self, user_id: Uuid, game_id: Uuid) -> Result<()> {
    self.ensure_writable("insert_cart_entry")?;
    self
      .conn
      .execute(
        "INSERT INTO users_carts (user_id, game_id, created_at) VALUES (?1, ?2, ?3)",
        params![encode_uuid(user_id), encode_uuid(game_id), encode_dt(Utc::now())],
      )
      .map_err(|e| match violation(&e) {
        Some(Violation::PrimaryKey) => Error::UserCartGameAlreadyExists { user_id, game_id },
        Some(Violation::ForeignKey) => self.missing_reference(user_id, game_id, e),
        _ => storage(e),
      })?;
    Ok(())
  }

  fn delete_cart_entry(&self, user_id: Uuid, game_id: Uuid) -> Result<()> {
    self.ensure_writable("delete_cart_entry")?;
    let deleted = self
      .conn
      .execute(
        "DELETE FROM users_carts WHERE user_id = ?1 AND game_id = ?2",
        params![encode_uuid(user_id), encode_uuid(game_id)],
      )
      .core()?;
    if deleted == 0 {
      return Err(Error::UserCartGameNotFound { user_id, game_id });
    }
    Ok(())
  }

  fn list_cart(&self, user_id: Uuid, page: &PageRequest<CartSort>) -> Result<Page<CartItem>> {
    let total = self.count("SELECT COUNT(*) FROM users_carts WHERE user_id = ?1", user_id)?;

    let sort_col = match page.sort.unwrap_or(CartSort::CreatedAt) {
      CartSort::CreatedAt => "c.created_at",
      CartSort::GameTitle => "g.title",
    };
    let dir = page.order.as_sql();
    let sql = format!(
      "SELECT {GAME_COLUMNS}, p.country, p.vatin, c.created_at
       FROM users_carts c
       JOIN games g      ON g.game_id = c.game_id
       JOIN publishers p ON p.publisher_id = g.publisher_id
       WHERE c.user_id = ?1
       ORDER BY {sort_col} {dir}, c.rowid {dir}
       LIMIT ?2 OFFSET ?3"
    );

    let mut stmt = self.conn.prepare(&sql).core()?;
    let rows = stmt
      .query_map(params![encode_uuid(user_id), page.limit, page.offset], |row| {
        let game = RawGame::from_row(row, 0)?;
        let country: String = row.get(GAME_COLUMN_COUNT)?;
        let vatin: String = row.get(GAME_COLUMN_COUNT + 1)?;
        let added_at: String = row.get(GAME_COLUMN_COUNT + 2)?;
        Ok((game, TaxIdentity { country, vatin }, added_at))
      })
      .core()?
      .collect::<rusqlite::Result<Vec<_>>>()
      .core()?;

    let results = rows
      .into_iter()
      .map(|(game, publisher_tax, added_at)| {
        Ok(CartItem {
          game: game.into_game()?,
          publisher_tax,
          added_at: decode_dt(&added_at)?,
        })
      })
      .collect::<crate::Result<Vec<_>>>()
      .core()?;

    Ok(Page { total, results })
  }

  // ── Library ───────────────────────────────────────────────────────────

  fn exists_library_entry(&self, user_id: Uuid, game_id: Uuid) -> Result<bool> {
    self
      .conn
      .query_row(
        "SELECT 1 FROM users_libraries WHERE user_id = ?1 AND game_id = ?2",
        params![encode_uuid(user_id), encode_uuid(game_id)],
        |_| Ok(()),
      )
      .optional()
      .core()
      .map(|row| row.is_some())
  }

  fn list_library(
    &self,
    user_id: Uuid,
    page: &PageRequest<LibrarySort>,
  ) -> Result<Page<LibraryItem>> {
    let total = self.count("SELECT COUNT(*) FROM users_libraries WHERE user_id = ?1", user_id)?;

    let sort_col = match page.sort.unwrap_or(LibrarySort::GameTitle) {
      LibrarySort::GameTitle => "g.title",
      LibrarySort::GamePrice => "CAST(g.price AS REAL)",
      LibrarySort::GameReleaseDate => "g.release_date",
    };
    let dir = page.order.as_sql();
    let sql = format!(
      "SELECT {GAME_COLUMNS}, l.created_at
       FROM users_libraries l
       JOIN games g ON g.game_id = l.game_id
       WHERE l.user_id = ?1
       ORDER BY {sort_col} {dir}, l.rowid {dir}
       LIMIT ?2 OFFSET ?3"
    );

    let mut stmt = self.conn.prepare(&sql).core()?;
    let rows = stmt
      .query_map(params![encode_uuid(user_id), page.limit, page.offset], |row| {
        let game = RawGame::from_row(row, 0)?;
        let acquired_at: String = row.get(GAME_COLUMN_COUNT)?;
        Ok((game, acquired_at))
      })
      .core()?
      .collect::<rusqlite::Result<Vec<_>>>()
      .core()?;

    let results = rows
      .into_iter()
      .map(|(game, acquired_at)| {
        Ok(LibraryItem { game: game.into_game()?, acquired_at: decode_dt(&acquired_at)? })
      })
      .collect::<crate::Result<Vec<_>>>()
      .core()?;

    Ok(Page { total, results })
  }

  // ── Purchase ──────────────────────────────────────────────────────────

  fn purchase_cart(&self, invoice: &Invoice) -> Result<()> {
    self.ensure_writable("purchase_cart")?;

    self.conn.execute_batch("SAVEPOINT purchase_cart").core()?;
    let applied = self
      .conn
      .execute(
        "DELETE FROM users_carts WHERE user_id = ?1",
        params![encode_uuid(invoice.user_id)],
      )
      .core()
      .and_then(|_| self.insert_library_entries(invoice))
      .and_then(|()| self.insert_invoice(invoice));

    match applied {
      Ok(()) => {
        self.conn.execute_batch("RELEASE purchase_cart").core()?;
        Ok(())
      }
      Err(e) => {
        self
          .conn
          .execute_batch("ROLLBACK TO purchase_cart; RELEASE purchase_cart")
          .core()?;
        Err(e)
      }
    }
  }

  fn list_invoices(&self, user_id: Uuid) -> Result<Vec<Invoice>> {
    let user_str = encode_uuid(user_id);

    let mut stmt = self
      .conn
      .prepare(
        "SELECT invoice_id, user_id, user_country, user_vatin, created_at
         FROM invoices
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC",
      )
      .core()?;
    let headers = stmt
      .query_map(params![user_str], |r| {
        Ok(RawInvoice {
          invoice_id:   r.get(0)?,
          user_id:      r.get(1)?,
          user_country: r.get(2)?,
          user_vatin:   r.get(3)?,
          created_at:   r.get(4)?,
        })
      })
      .core()?
      .collect::<rusqlite::Result<Vec<_>>>()
      .core()?;

    let mut stmt = self
      .conn
      .prepare(
        "SELECT l.invoice_id, l.game_id, l.price, l.tax,
                l.publisher_country, l.publisher_vatin
         FROM invoice_lines l
         JOIN invoices i ON i.invoice_id = l.invoice_id
         WHERE i.user_id = ?1
         ORDER BY l.invoice_id, l.position",
      )
      .core()?;
    let raw_lines = stmt
      .query_map(params![user_str], |r| {
        Ok(RawInvoiceLine {
          invoice_id:        r.get(0)?,
          game_id:           r.get(1)?,
          price:             r.get(2)?,
          tax:               r.get(3)?,
          publisher_country: r.get(4)?,
          publisher_vatin:   r.get(5)?,
        })
      })
      .core()?
      .collect::<rusqlite::Result<Vec<_>>>()
      .core()?;

    let mut lines: HashMap<Uuid, Vec<InvoiceLine>> = HashMap::new();
    for raw in raw_lines {
      let (invoice_id, line) = raw.into_line().core()?;
      lines.entry(invoice_id).or_default().push(line);
    }

    headers
      .into_iter()
      .map(|raw| {
        let id = crate::encode::decode_uuid(&raw.invoice_id)?;
        raw.into_invoice(lines.remove(&id).unwrap_or_default())
      })
      .collect::<crate::Result<Vec<_>>>()
      .core()
  }
}
