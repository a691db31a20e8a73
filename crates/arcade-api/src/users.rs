//! Handlers for `/users` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/users` | Body: [`NewUser`]; returns 201 + user |
//! | `GET`   | `/users/{user_id}` | 404 if not found |
//! | `PATCH` | `/users/{user_id}` | Body: [`UserPatch`]; a `balance` field is rejected |

use std::sync::Arc;

use arcade_core::{
  Storefront,
  store::LedgerStore,
  user::{NewUser, User, UserPatch},
};
use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `POST /users`
pub async fn create<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = body?;
  let user = front.register_user(input).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/{user_id}`
pub async fn get_one<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  Ok(Json(front.get_user(user_id).await?))
}

/// `PATCH /users/{user_id}`
pub async fn patch<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(user_id): Path<Uuid>,
  body: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
  let Json(patch) = body?;
  Ok(Json(front.patch_user(user_id, patch).await?))
}
