//! JSON REST API for the Arcade storefront.
//!
//! Exposes an axum [`Router`] backed by a [`Storefront`] over any
//! [`arcade_core::store::LedgerStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", arcade_api::api_router(front.clone()))
//! ```

pub mod cart;
pub mod catalog;
pub mod error;
pub mod library;
pub mod page;
pub mod users;

use std::sync::Arc;

use arcade_core::{Storefront, store::LedgerStore};
use axum::{
  Router,
  routing::{get, post},
};

pub use error::ApiError;

/// Build a fully-materialised API router for `front`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(front: Arc<Storefront<S>>) -> Router<()>
where
  S: LedgerStore + 'static,
{
  Router::new()
    // Identity
    .route("/users", post(users::create::<S>))
    .route("/users/{user_id}", get(users::get_one::<S>).patch(users::patch::<S>))
    // Catalog
    .route("/publishers", post(catalog::create_publisher::<S>))
    .route(
      "/publishers/{publisher_id}",
      get(catalog::get_publisher::<S>).patch(catalog::patch_publisher::<S>),
    )
    .route("/games", post(catalog::create_game::<S>))
    .route("/games/{game_id}", get(catalog::get_game::<S>).patch(catalog::patch_game::<S>))
    // Cart
    .route("/users/{user_id}/cart", get(cart::list::<S>))
    .route("/users/{user_id}/cart/purchase", post(cart::purchase::<S>))
    .route("/users/{user_id}/cart/{game_id}", post(cart::add::<S>).delete(cart::remove::<S>))
    // Library
    .route("/users/{user_id}/library", get(library::list::<S>))
    .route("/users/{user_id}/invoices", get(library::invoices::<S>))
    .with_state(front)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
