//! SQL schema for the Arcade SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Money columns hold decimal strings (`rust_decimal` formatting) and are
/// never summed in SQL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,   -- YYYY-MM-DD
    country       TEXT NOT NULL,
    vatin         TEXT NOT NULL UNIQUE,
    balance       TEXT NOT NULL DEFAULT '0',
    created_at    TEXT NOT NULL,
    modified_at   TEXT NOT NULL,
    CHECK (CAST(balance AS REAL) >= 0)
);

CREATE TABLE IF NOT EXISTS publishers (
    publisher_id TEXT PRIMARY KEY,
    email        TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    country      TEXT NOT NULL,
    vatin        TEXT NOT NULL UNIQUE,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS games (
    game_id      TEXT PRIMARY KEY,
    publisher_id TEXT NOT NULL REFERENCES publishers(publisher_id),
    title        TEXT NOT NULL,
    price        TEXT NOT NULL,
    is_active    INTEGER NOT NULL,
    release_date TEXT,             -- NULL: never released
    age_rating   TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    modified_at  TEXT NOT NULL,
    CHECK (CAST(price AS REAL) >= 0)
);

CREATE TABLE IF NOT EXISTS users_carts (
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    game_id    TEXT NOT NULL REFERENCES games(game_id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, game_id)
);

-- Library rows are never updated or deleted.
CREATE TABLE IF NOT EXISTS users_libraries (
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    game_id    TEXT NOT NULL REFERENCES games(game_id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, game_id)
);

-- Invoices are append-only; tax identities are snapshots.
CREATE TABLE IF NOT EXISTS invoices (
    invoice_id   TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    user_country TEXT NOT NULL,
    user_vatin   TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS invoice_lines (
    invoice_id        TEXT NOT NULL REFERENCES invoices(invoice_id),
    position          INTEGER NOT NULL,
    game_id           TEXT NOT NULL REFERENCES games(game_id),
    price             TEXT NOT NULL,
    tax               TEXT NOT NULL,
    publisher_country TEXT NOT NULL,
    publisher_vatin   TEXT NOT NULL,
    PRIMARY KEY (invoice_id, position),
    UNIQUE (invoice_id, game_id)
);

CREATE INDEX IF NOT EXISTS games_publisher_idx   ON games(publisher_id);
CREATE INDEX IF NOT EXISTS carts_created_idx     ON users_carts(user_id, created_at);
CREATE INDEX IF NOT EXISTS invoices_user_idx     ON invoices(user_id, created_at);

PRAGMA user_version = 1;
";
