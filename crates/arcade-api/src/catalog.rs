//! Handlers for publisher and game endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/publishers` | Body: [`NewPublisher`]; returns 201 |
//! | `GET`   | `/publishers/{publisher_id}` | 404 if not found |
//! | `PATCH` | `/publishers/{publisher_id}` | Body: [`PublisherPatch`]; omitted fields are kept |
//! | `POST`  | `/games` | Body: [`NewGame`]; 404 if the publisher is unknown |
//! | `GET`   | `/games/{game_id}` | 404 if not found |
//! | `PATCH` | `/games/{game_id}` | Body: [`GamePatch`]; omitted fields are kept |

use std::sync::Arc;

use arcade_core::{
  Storefront,
  game::{Game, GamePatch, NewGame, NewPublisher, Publisher, PublisherPatch},
  store::LedgerStore,
};
use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Publishers ──────────────────────────────────────────────────────────────

/// `POST /publishers`
pub async fn create_publisher<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  body: Result<Json<NewPublisher>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = body?;
  let publisher = front.create_publisher(input).await?;
  Ok((StatusCode::CREATED, Json(publisher)))
}

/// `GET /publishers/{publisher_id}`
pub async fn get_publisher<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(publisher_id): Path<Uuid>,
) -> Result<Json<Publisher>, ApiError> {
  Ok(Json(front.get_publisher(publisher_id).await?))
}

/// `PATCH /publishers/{publisher_id}`
pub async fn patch_publisher<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(publisher_id): Path<Uuid>,
  body: Result<Json<PublisherPatch>, JsonRejection>,
) -> Result<Json<Publisher>, ApiError> {
  let Json(patch) = body?;
  Ok(Json(front.patch_publisher(publisher_id, patch).await?))
}

// ─── Games ───────────────────────────────────────────────────────────────────

/// `POST /games`
pub async fn create_game<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  body: Result<Json<NewGame>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = body?;
  let game = front.create_game(input).await?;
  Ok((StatusCode::CREATED, Json(game)))
}

/// `GET /games/{game_id}`
pub async fn get_game<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(game_id): Path<Uuid>,
) -> Result<Json<Game>, ApiError> {
  Ok(Json(front.get_game(game_id).await?))
}

/// `PATCH /games/{game_id}`
pub async fn patch_game<S: LedgerStore>(
  State(front): State<Arc<Storefront<S>>>,
  Path(game_id): Path<Uuid>,
  body: Result<Json<GamePatch>, JsonRejection>,
) -> Result<Json<Game>, ApiError> {
  let Json(patch) = body?;
  Ok(Json(front.patch_game(game_id, patch).await?))
}
