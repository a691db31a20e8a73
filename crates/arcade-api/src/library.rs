//! Handlers for what a user owns: `/users/{user_id}/library` and
//! `/users/{user_id}/invoices`.

use std::sync::Arc;

use arcade_core::{
  Storefront,
  cart::{LibraryItem, LibrarySort},
  invoice::Invoice,
  page::Page,
  store::LedgerStore,
};
use axum::{
  Json,
  extract::{Path, Query, State, rejection::QueryRejection},
};
use uuid::Uuid;

use crate::{error::ApiError, page::PageParams};

/// `GET /users/{user_id}/library[?sort=gameTitle|gamePrice|gameReleaseDate&order&limit&offset]`
pub async fn list<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(user_id): Path<Uuid>,
  params: Result<Query<PageParams<LibrarySort>>, QueryRejection>,
) -> Result<Json<Page<LibraryItem>>, ApiError> {
  let Query(params) = params?;
  Ok(Json(front.list_library(user_id, params.into()).await?))
}

/// `GET /users/{user_id}/invoices`, newest first.
pub async fn invoices<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
  Ok(Json(front.list_invoices(user_id).await?))
}
