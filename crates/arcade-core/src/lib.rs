//! Core types, trait definitions and the commerce engine for the Arcade
//! storefront.
//!
//! It has no HTTP or database dependencies.
//! Storage backends implement [`store::LedgerStore`]; the HTTP layer drives
//! [`storefront::Storefront`].

pub mod cart;
pub mod eligibility;
pub mod error;
pub mod game;
pub mod invoice;
pub mod money;
pub mod notify;
pub mod page;
pub mod purchase;
pub mod store;
pub mod storefront;
pub mod user;

pub use error::{Error, ErrorKind, Result};
pub use storefront::{CommerceConfig, Storefront};
