//! Handlers for `/users/{user_id}/cart` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users/{user_id}/cart` | `?sort=createdAt\|gameTitle&order&limit&offset` |
//! | `POST`   | `/users/{user_id}/cart/{game_id}` | 204; eligibility failures are 404/409 |
//! | `DELETE` | `/users/{user_id}/cart/{game_id}` | 204; 404 if not carted |
//! | `POST`   | `/users/{user_id}/cart/purchase` | 201 + invoice |
//!
//! Write handlers hand the storefront a cancellation token that fires when
//! the request future is dropped, so an abandoned request rolls back.

use std::sync::Arc;

use arcade_core::{
  Storefront,
  cart::{CartItem, CartSort},
  page::Page,
  store::LedgerStore,
};
use axum::{
  Json,
  extract::{Path, Query, State, rejection::QueryRejection},
  http::StatusCode,
  response::IntoResponse,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{error::ApiError, page::PageParams};

/// `GET /users/{user_id}/cart`
pub async fn list<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(user_id): Path<Uuid>,
  params: Result<Query<PageParams<CartSort>>, QueryRejection>,
) -> Result<Json<Page<CartItem>>, ApiError> {
  let Query(params) = params?;
  Ok(Json(front.list_cart(user_id, params.into()).await?))
}

/// `POST /users/{user_id}/cart/{game_id}`
pub async fn add<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path((user_id, game_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  let cancel = CancellationToken::new();
  let _guard = cancel.clone().drop_guard();
  front.add_to_cart(user_id, game_id, &cancel).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /users/{user_id}/cart/{game_id}`
pub async fn remove<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path((user_id, game_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  front.remove_from_cart(user_id, game_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /users/{user_id}/cart/purchase`
pub async fn purchase<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let cancel = CancellationToken::new();
  let _guard = cancel.clone().drop_guard();
  let invoice = front.purchase(user_id, &cancel).await?;
  Ok((StatusCode::CREATED, Json(invoice)))
}
