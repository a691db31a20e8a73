//! Users and the tax identity shared with publishers.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, money::check_amount};

/// Country and VAT identification number of a tax subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxIdentity {
  /// ISO 3166-1 alpha-2 region code.
  pub country: String,
  pub vatin:   String,
}

/// Registration input for a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub display_name:  String,
  pub date_of_birth: NaiveDate,
  pub tax:           TaxIdentity,
  /// Opening balance; defaults to zero.
  #[serde(default)]
  pub balance:       Decimal,
}

impl NewUser {
  /// Reject inputs that would break stored invariants.
  pub fn validate(&self) -> Result<()> {
    check_amount(self.balance, "balance")?;
    if self.username.is_empty() {
      return Err(Error::InvalidField("username"));
    }
    if !self.email.contains('@') {
      return Err(Error::InvalidField("email"));
    }
    Ok(())
  }
}

/// A partial update of a user's profile. `None` leaves a field as is.
///
/// The balance is not patchable; only purchases change it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
  #[serde(default)]
  pub username:      Option<String>,
  #[serde(default)]
  pub email:         Option<String>,
  #[serde(default)]
  pub display_name:  Option<String>,
  #[serde(default)]
  pub date_of_birth: Option<NaiveDate>,
  #[serde(default)]
  pub country:       Option<String>,
  #[serde(default)]
  pub vatin:         Option<String>,
}

impl UserPatch {
  pub fn validate(&self) -> Result<()> {
    if self.username.as_deref().is_some_and(str::is_empty) {
      return Err(Error::InvalidField("username"));
    }
    if self.email.as_deref().is_some_and(|e| !e.contains('@')) {
      return Err(Error::InvalidField("email"));
    }
    if self.vatin.as_deref().is_some_and(str::is_empty) {
      return Err(Error::InvalidField("vatin"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      String,
  pub email:         String,
  pub display_name:  String,
  pub date_of_birth: NaiveDate,
  pub tax:           TaxIdentity,
  pub balance:       Decimal,
  pub created_at:    DateTime<Utc>,
  pub modified_at:   DateTime<Utc>,
}

impl User {
  /// Age in whole years at `now`. See [`age_on`].
  pub fn age_at(&self, now: DateTime<Utc>) -> i32 {
    age_on(self.date_of_birth, now.date_naive())
  }
}

/// Age in whole years on `today` for someone born on `birth`.
///
/// Compares ordinal days of the year to decide whether the birthday has
/// happened yet, so dates after Feb 28 are off by one day across leap and
/// non-leap years.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
  let mut age = today.year() - birth.year();
  if today.ordinal() < birth.ordinal() {
    age -= 1;
  }
  age
}
