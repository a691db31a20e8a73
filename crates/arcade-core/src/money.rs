//! Monetary amounts and the tax rate.
//!
//! All arithmetic is exact [`Decimal`] arithmetic. Amounts are only rounded
//! (two places, midpoint away from zero) when rendered for humans.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Places used when displaying an amount.
const DISPLAY_PLACES: u32 = 2;

/// Largest price or balance accepted (1,000,000,000).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Reject a price or balance outside `0..=MAX_AMOUNT`.
pub fn check_amount(amount: Decimal, field: &'static str) -> Result<()> {
  if amount < Decimal::ZERO || amount > MAX_AMOUNT {
    return Err(Error::InvalidField(field));
  }
  Ok(())
}

/// Exact sum of `amounts`, failing instead of overflowing.
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal> {
  amounts
    .into_iter()
    .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a))
    .ok_or(Error::AmountOutOfRange)
}

/// Format an amount with exactly two decimal places.
pub fn format_amount(amount: Decimal) -> String {
  let rounded = amount
    .round_dp_with_strategy(DISPLAY_PLACES, RoundingStrategy::MidpointAwayFromZero);
  format!("{rounded:.2}")
}

// ─── Tax rate ────────────────────────────────────────────────────────────────

/// A tax rate, a fraction in the open interval (0, 1).
///
/// Applied uniformly to every game in a purchase. Supplied by configuration,
/// never by users or games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate(Decimal);

impl TaxRate {
  pub fn new(rate: Decimal) -> Result<Self> {
    if rate <= Decimal::ZERO || rate >= Decimal::ONE {
      return Err(Error::InvalidField("tax_rate"));
    }
    Ok(Self(rate))
  }

  pub fn value(self) -> Decimal { self.0 }

  /// Tax owed on `amount`.
  pub fn tax_on(self, amount: Decimal) -> Result<Decimal> {
    amount.checked_mul(self.0).ok_or(Error::AmountOutOfRange)
  }

  /// `amount` with tax applied.
  pub fn with_tax(self, amount: Decimal) -> Result<Decimal> {
    amount
      .checked_add(self.tax_on(amount)?)
      .ok_or(Error::AmountOutOfRange)
  }

  /// The rate as a whole percentage, e.g. `"23"` for 0.23.
  pub fn percent_string(self) -> String {
    (self.0 * Decimal::ONE_HUNDRED)
      .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
      .normalize()
      .to_string()
  }
}

impl Default for TaxRate {
  /// 23%.
  fn default() -> Self { Self(Decimal::new(23, 2)) }
}

impl TryFrom<Decimal> for TaxRate {
  type Error = Error;

  fn try_from(rate: Decimal) -> Result<Self> { Self::new(rate) }
}

impl From<TaxRate> for Decimal {
  fn from(rate: TaxRate) -> Self { rate.0 }
}

// ─── Totals ──────────────────────────────────────────────────────────────────

/// Subtotal, tax and total of a set of prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
  pub subtotal: Decimal,
  pub tax:      Decimal,
  pub total:    Decimal,
}

impl Totals {
  pub fn compute(prices: impl IntoIterator<Item = Decimal>, rate: TaxRate) -> Result<Self> {
    let subtotal = checked_sum(prices)?;
    let tax = rate.tax_on(subtotal)?;
    let total = subtotal.checked_add(tax).ok_or(Error::AmountOutOfRange)?;
    Ok(Self { subtotal, tax, total })
  }
}
