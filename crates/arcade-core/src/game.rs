//! Catalog types: games and their publishers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, money::check_amount, user::TaxIdentity};

// ─── Publisher ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPublisher {
  pub email: String,
  pub name:  String,
  pub tax:   TaxIdentity,
}

/// A partial update of a publisher. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherPatch {
  #[serde(default)]
  pub email:   Option<String>,
  #[serde(default)]
  pub name:    Option<String>,
  #[serde(default)]
  pub country: Option<String>,
  #[serde(default)]
  pub vatin:   Option<String>,
}

impl PublisherPatch {
  pub fn validate(&self) -> Result<()> {
    if self.email.as_deref().is_some_and(|e| !e.contains('@')) {
      return Err(Error::InvalidField("email"));
    }
    if self.name.as_deref().is_some_and(str::is_empty) {
      return Err(Error::InvalidField("name"));
    }
    if self.vatin.as_deref().is_some_and(str::is_empty) {
      return Err(Error::InvalidField("vatin"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
  pub publisher_id: Uuid,
  pub email:        String,
  pub name:         String,
  pub tax:          TaxIdentity,
  pub created_at:   DateTime<Utc>,
}

// ─── Age rating ──────────────────────────────────────────────────────────────

/// Minimum age required to buy a game, e.g. `"18"`.
///
/// Stored as text; a rating that is not exactly a decimal integer, surrounding
/// whitespace included, imposes no restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgeRating(pub String);

impl AgeRating {
  pub fn value(&self) -> i32 { self.0.parse().unwrap_or(0) }
}

impl From<&str> for AgeRating {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

// ─── Game ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGame {
  pub publisher_id: Uuid,
  pub title:        String,
  pub price:        Decimal,
  pub is_active:    bool,
  pub release_date: Option<DateTime<Utc>>,
  pub age_rating:   AgeRating,
}

impl NewGame {
  pub fn validate(&self) -> Result<()> {
    check_amount(self.price, "price")?;
    if self.title.is_empty() {
      return Err(Error::InvalidField("title"));
    }
    Ok(())
  }
}

/// A partial update of a game's catalog fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamePatch {
  #[serde(default)]
  pub title:        Option<String>,
  #[serde(default)]
  pub price:        Option<Decimal>,
  #[serde(default)]
  pub is_active:    Option<bool>,
  #[serde(default)]
  pub release_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub age_rating:   Option<AgeRating>,
}

impl GamePatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(price) = self.price {
      check_amount(price, "price")?;
    }
    if self.title.as_deref().is_some_and(str::is_empty) {
      return Err(Error::InvalidField("title"));
    }
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.price.is_none()
      && self.is_active.is_none()
      && self.release_date.is_none()
      && self.age_rating.is_none()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
  pub game_id:      Uuid,
  pub publisher_id: Uuid,
  pub title:        String,
  pub price:        Decimal,
  pub is_active:    bool,
  pub release_date: Option<DateTime<Utc>>,
  pub age_rating:   AgeRating,
  pub created_at:   DateTime<Utc>,
  pub modified_at:  DateTime<Utc>,
}

impl Game {
  /// Released games have a release date that is not in the future.
  pub fn is_released(&self, now: DateTime<Utc>) -> bool {
    self.release_date.is_some_and(|at| at <= now)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::money::MAX_AMOUNT;

  #[test]
  fn age_rating_parses_integers() {
    assert_eq!(AgeRating::from("18").value(), 18);
    assert_eq!(AgeRating::from("7").value(), 7);
  }

  #[test]
  fn patch_rejects_negative_price() {
    let patch = GamePatch { price: Some(Decimal::new(-1, 0)), ..Default::default() };
    assert!(matches!(patch.validate(), Err(Error::InvalidField("price"))));
    assert!(GamePatch::default().is_empty());
  }

  #[test]
  fn prices_above_the_cap_are_rejected() {
    let patch = GamePatch { price: Some(Decimal::MAX), ..Default::default() };
    assert!(matches!(patch.validate(), Err(Error::InvalidField("price"))));

    let game = NewGame {
      publisher_id: Uuid::new_v4(),
      title:        "Whale".into(),
      price:        MAX_AMOUNT + Decimal::new(1, 2),
      is_active:    true,
      release_date: None,
      age_rating:   AgeRating::from("0"),
    };
    assert!(matches!(game.validate(), Err(Error::InvalidField("price"))));
  }

  #[test]
  fn non_numeric_age_rating_is_unrestricted() {
    assert_eq!(AgeRating::from("M").value(), 0);
    assert_eq!(AgeRating::from("").value(), 0);
    assert_eq!(AgeRating::from(" 18").value(), 0);
    assert_eq!(AgeRating::from("18 ").value(), 0);
  }
}
