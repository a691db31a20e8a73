//! Cart-add eligibility.
//!
//! The checks run in a fixed order and the first failure wins, so the order
//! decides which error a caller sees when several conditions fail at once:
//!
//! 1. the game exists ([`Error::GameNotFound`]);
//! 2. the user does not already own it ([`Error::UserLibraryGameAlreadyExists`]);
//! 3. the game is active ([`Error::GameNotActive`]);
//! 4. the game is released ([`Error::GameNotReleased`]);
//! 5. the user exists ([`Error::UserNotFound`]);
//! 6. the user is old enough ([`Error::UserNotOldEnough`]);
//! 7. the game is not already carted ([`Error::UserCartGameAlreadyExists`],
//!    raised by the insert).
//!
//! Ownership is reported ahead of the game's catalog state: an owned game
//! stays owned whatever happens to its listing.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  cart::CartItem,
  game::Game,
  store::LedgerTx,
  user::User,
};

/// The game must be active and released at `now`.
pub fn check_game_state(game: &Game, now: DateTime<Utc>) -> Result<()> {
  if !game.is_active {
    return Err(Error::GameNotActive(game.game_id));
  }
  if !game.is_released(now) {
    return Err(Error::GameNotReleased(game.game_id));
  }
  Ok(())
}

/// The user must have reached the game's age rating at `now`.
pub fn check_age(user: &User, game: &Game, now: DateTime<Utc>) -> Result<()> {
  if user.age_at(now) < game.age_rating.value() {
    return Err(Error::UserNotOldEnough {
      user_id: user.user_id,
      game_id: game.game_id,
    });
  }
  Ok(())
}

/// Re-check a carted game at purchase time.
///
/// A game deactivated or unreleased since it was carted fails with
/// [`Error::CartGameNotPurchasable`].
pub fn check_purchasable(item: &CartItem, now: DateTime<Utc>) -> Result<()> {
  check_game_state(&item.game, now)
    .map_err(|_| Error::CartGameNotPurchasable(item.game.game_id))
}

/// Run every eligibility check and insert the cart entry.
///
/// Must be called inside a read-write transaction so the facts checked here
/// cannot change before the insert.
pub fn add_to_cart(
  tx: &dyn LedgerTx,
  user_id: Uuid,
  game_id: Uuid,
  now: DateTime<Utc>,
) -> Result<()> {
  let game = tx.get_game(game_id)?.ok_or(Error::GameNotFound(game_id))?;

  if tx.exists_library_entry(user_id, game_id)? {
    return Err(Error::UserLibraryGameAlreadyExists { user_id, game_id });
  }

  check_game_state(&game, now)?;

  let user = tx.get_user(user_id)?.ok_or(Error::UserNotFound(user_id))?;
  check_age(&user, &game, now)?;

  tx.insert_cart_entry(user_id, game_id)
}
