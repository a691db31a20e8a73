//! Error types for `arcade-core`.
//!
//! Every workflow maps whatever went wrong underneath to exactly one variant
//! here before returning. [`Error::kind`] groups the variants into the
//! classes callers branch on.

use thiserror::Error;
use uuid::Uuid;

/// Boxed source for opaque storage and notification failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
  // ── Not found ─────────────────────────────────────────────────────────

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("game not found: {0}")]
  GameNotFound(Uuid),

  #[error("publisher not found: {0}")]
  PublisherNotFound(Uuid),

  #[error("game {game_id} is not in the cart of user {user_id}")]
  UserCartGameNotFound { user_id: Uuid, game_id: Uuid },

  // ── Conflicts ─────────────────────────────────────────────────────────

  #[error("game {game_id} is already in the cart of user {user_id}")]
  UserCartGameAlreadyExists { user_id: Uuid, game_id: Uuid },

  #[error("game {game_id} is already in the library of user {user_id}")]
  UserLibraryGameAlreadyExists { user_id: Uuid, game_id: Uuid },

  #[error("game not active: {0}")]
  GameNotActive(Uuid),

  #[error("game not released: {0}")]
  GameNotReleased(Uuid),

  #[error("user {user_id} is not old enough for game {game_id}")]
  UserNotOldEnough { user_id: Uuid, game_id: Uuid },

  #[error("cart of user {0} is empty")]
  UserCartEmpty(Uuid),

  #[error("balance of user {0} is insufficient")]
  UserBalanceInsufficient(Uuid),

  /// A carted game stopped being purchasable between cart-add and purchase.
  #[error("game {0} in the cart is no longer purchasable")]
  CartGameNotPurchasable(Uuid),

  /// A sum or tax computed from stored amounts does not fit a decimal.
  #[error("amount out of range")]
  AmountOutOfRange,

  /// A unique field (username, email, vatin) is already taken.
  #[error("{0} already exists")]
  AlreadyExists(&'static str),

  // ── Invalid input ─────────────────────────────────────────────────────

  #[error("invalid field value: {0}")]
  InvalidField(&'static str),

  #[error("invalid filter value: {0}")]
  InvalidFilter(&'static str),

  // ── Internal ──────────────────────────────────────────────────────────

  #[error("invariant violation: {0}")]
  InvariantViolation(String),

  #[error("operation cancelled")]
  Cancelled,

  #[error("notification error: {0}")]
  Notification(#[source] BoxError),

  #[error("storage error: {0}")]
  Storage(#[source] BoxError),
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The referenced resource does not exist.
  NotFound,
  /// A valid business state that prevents the request right now.
  Conflict,
  /// The request itself carried an invalid value.
  Invalid,
  /// Internal inconsistency; a caller or programmer error.
  Invariant,
  /// Storage, network or cancellation failure. Retried by the caller.
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UserNotFound(_)
      | Self::GameNotFound(_)
      | Self::PublisherNotFound(_)
      | Self::UserCartGameNotFound { .. } => ErrorKind::NotFound,

      Self::UserCartGameAlreadyExists { .. }
      | Self::UserLibraryGameAlreadyExists { .. }
      | Self::GameNotActive(_)
      | Self::GameNotReleased(_)
      | Self::UserNotOldEnough { .. }
      | Self::UserCartEmpty(_)
      | Self::UserBalanceInsufficient(_)
      | Self::CartGameNotPurchasable(_)
      | Self::AmountOutOfRange
      | Self::AlreadyExists(_) => ErrorKind::Conflict,

      Self::InvalidField(_) | Self::InvalidFilter(_) => ErrorKind::Invalid,

      Self::InvariantViolation(_) => ErrorKind::Invariant,

      Self::Cancelled | Self::Notification(_) | Self::Storage(_) => {
        ErrorKind::Internal
      }
    }
  }

  /// Whether the error is an expected business outcome rather than a fault.
  pub fn is_business(&self) -> bool {
    matches!(
      self.kind(),
      ErrorKind::NotFound | ErrorKind::Conflict | ErrorKind::Invalid
    )
  }

  /// Wrap any storage-layer error as an opaque [`Error::Storage`].
  pub fn storage(e: impl Into<BoxError>) -> Self { Self::Storage(e.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn business_errors_are_distinct_from_faults() {
    let id = Uuid::new_v4();
    assert_eq!(Error::UserNotFound(id).kind(), ErrorKind::NotFound);
    assert_eq!(Error::UserCartEmpty(id).kind(), ErrorKind::Conflict);
    assert_eq!(
      Error::InvariantViolation("x".into()).kind(),
      ErrorKind::Invariant
    );
    assert_eq!(Error::Cancelled.kind(), ErrorKind::Internal);

    assert!(Error::UserBalanceInsufficient(id).is_business());
    assert!(!Error::storage("disk on fire").is_business());
  }
}
