//! Error type for the notification relay.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("relay request failed: {0}")]
  Relay(#[from] reqwest::Error),

  #[error("relay rejected the message with status {0}")]
  Rejected(reqwest::StatusCode),

  #[error("relay sender needs a tokio runtime: {0}")]
  NoRuntime(#[from] tokio::runtime::TryCurrentError),

  #[error("invalid relay url {url}: {reason}")]
  InvalidRelayUrl { url: String, reason: String },
}
