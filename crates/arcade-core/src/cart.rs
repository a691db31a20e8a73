//! Cart and library membership.
//!
//! A cart entry says a user intends to buy a game; a library entry says the
//! user owns it. Both are keyed by `(user_id, game_id)`. Library entries are
//! only ever created by a purchase and are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{game::Game, user::TaxIdentity};

// ─── Cart ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CartSort {
  CreatedAt,
  GameTitle,
}

/// A carted game together with what a purchase needs to snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
  pub game:          Game,
  /// Tax identity of the game's publisher at read time.
  pub publisher_tax: TaxIdentity,
  pub added_at:      DateTime<Utc>,
}

// ─── Library ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LibrarySort {
  GameTitle,
  GamePrice,
  GameReleaseDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryItem {
  pub game:        Game,
  pub acquired_at: DateTime<Utc>,
}
