//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Bodies are `{"code": "...", "error": "..."}`. Internal failures are
//! logged by the storefront and answered with a generic message.

use arcade_core::{Error, ErrorKind};
use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Commerce(#[from] Error),

  #[error("malformed body: {0}")]
  Body(#[from] JsonRejection),

  #[error("invalid filter: {0}")]
  Query(#[from] QueryRejection),
}

/// Stable machine-readable code for `e`.
fn code(e: &Error) -> &'static str {
  match e {
    Error::UserNotFound(_) => "user_not_found",
    Error::GameNotFound(_) => "game_not_found",
    Error::PublisherNotFound(_) => "publisher_not_found",
    Error::UserCartGameNotFound { .. } => "user_cart_game_not_found",
    Error::UserCartGameAlreadyExists { .. } => "user_cart_game_already_exists",
    Error::UserLibraryGameAlreadyExists { .. } => "user_library_game_already_exists",
    Error::GameNotActive(_) => "game_not_active",
    Error::GameNotReleased(_) => "game_not_released",
    Error::UserNotOldEnough { .. } => "user_not_old_enough",
    Error::UserCartEmpty(_) => "user_cart_empty",
    Error::UserBalanceInsufficient(_) => "user_balance_insufficient",
    Error::CartGameNotPurchasable(_) => "cart_game_not_purchasable",
    Error::AmountOutOfRange => "amount_out_of_range",
    Error::AlreadyExists(_) => "already_exists",
    Error::InvalidField(_) => "invalid_field",
    Error::InvalidFilter(_) => "invalid_filter",
    Error::InvariantViolation(_)
    | Error::Cancelled
    | Error::Notification(_)
    | Error::Storage(_) => "internal",
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code, message) = match &self {
      ApiError::Commerce(e) => match e.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, code(e), e.to_string()),
        ErrorKind::Conflict => (StatusCode::CONFLICT, code(e), e.to_string()),
        ErrorKind::Invalid => (StatusCode::BAD_REQUEST, code(e), e.to_string()),
        ErrorKind::Invariant | ErrorKind::Internal => (
          StatusCode::INTERNAL_SERVER_ERROR,
          code(e),
          "internal server error".to_owned(),
        ),
      },
      ApiError::Body(e) => (e.status(), "invalid_body", e.body_text()),
      ApiError::Query(e) => (StatusCode::BAD_REQUEST, "invalid_filter", e.body_text()),
    };
    (status, Json(json!({ "code": code, "error": message }))).into_response()
  }
}
