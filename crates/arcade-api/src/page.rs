//! Query-string form of [`PageRequest`].

use arcade_core::page::{DEFAULT_LIMIT, Order, PageRequest};
use serde::Deserialize;

/// `?sort=<field>&order=asc|desc&limit=<n>&offset=<n>`
///
/// Unknown sort fields or orders are rejected by the extractor; the limit
/// range is checked by the storefront.
#[derive(Debug, Deserialize)]
pub struct PageParams<S> {
  pub sort:   Option<S>,
  #[serde(default)]
  pub order:  Order,
  pub limit:  Option<u32>,
  pub offset: Option<u32>,
}

impl<S> From<PageParams<S>> for PageRequest<S> {
  fn from(p: PageParams<S>) -> Self {
    PageRequest {
      sort:   p.sort,
      order:  p.order,
      limit:  p.limit.unwrap_or(DEFAULT_LIMIT),
      offset: p.offset.unwrap_or(0),
    }
  }
}
