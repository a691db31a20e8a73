//! The pagination contract shared by cart and library listings.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest page a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Page size used when the caller does not pick one.
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
  #[default]
  Asc,
  Desc,
}

impl Order {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

/// A sort/order/limit/offset request over a listing sorted by `S`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<S> {
  pub sort:   Option<S>,
  pub order:  Order,
  pub limit:  u32,
  pub offset: u32,
}

impl<S> Default for PageRequest<S> {
  fn default() -> Self {
    Self { sort: None, order: Order::Asc, limit: DEFAULT_LIMIT, offset: 0 }
  }
}

impl<S> PageRequest<S> {
  pub fn new(sort: S, order: Order, limit: u32, offset: u32) -> Self {
    Self { sort: Some(sort), order, limit, offset }
  }

  pub fn validate(&self) -> Result<()> {
    if self.limit == 0 || self.limit > MAX_LIMIT {
      return Err(Error::InvalidFilter("limit"));
    }
    Ok(())
  }
}

/// One page of results plus the size of the full listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub total:   u64,
  pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn limit_bounds() {
    let mut page = PageRequest::<()>::default();
    assert!(page.validate().is_ok());

    page.limit = 0;
    assert!(matches!(page.validate(), Err(Error::InvalidFilter("limit"))));

    page.limit = MAX_LIMIT + 1;
    assert!(page.validate().is_err());

    page.limit = MAX_LIMIT;
    assert!(page.validate().is_ok());
  }
}
