//! HTTP server wiring for the Arcade storefront.
//!
//! Loads [`ServerConfig`], picks the notification sender, and mounts the
//! JSON API under `/api`.

pub mod error;
pub mod relay;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use arcade_core::{
  CommerceConfig, Storefront,
  money::TaxRate,
  notify::{NoopSender, NotificationSender},
  storefront::DEFAULT_DRAIN_BATCH,
  store::LedgerStore,
};
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use relay::RelaySender;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ARCADE_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// VAT rate applied at purchase, e.g. `0.23`.
  #[serde(default)]
  pub tax_rate:         TaxRate,
  #[serde(default = "default_drain_batch")]
  pub drain_batch:      u32,
  /// Mail relay endpoint. Invoice emails are dropped when unset.
  #[serde(default)]
  pub notify_relay_url: Option<String>,
  #[serde(default = "default_notify_from")]
  pub notify_from:      String,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("arcade.db") }
fn default_drain_batch() -> u32 { DEFAULT_DRAIN_BATCH }
fn default_notify_from() -> String { "store@arcade.example".into() }

impl ServerConfig {
  pub fn commerce(&self) -> CommerceConfig {
    CommerceConfig { tax_rate: self.tax_rate, drain_batch: self.drain_batch }
  }

  /// The configured sender: the relay if a URL is set, otherwise a no-op.
  ///
  /// Must be called from within a tokio runtime.
  pub fn sender(&self) -> Result<Arc<dyn NotificationSender>, Error> {
    match &self.notify_relay_url {
      Some(url) => Ok(Arc::new(RelaySender::new(url, self.notify_from.clone())?)),
      None => Ok(Arc::new(NoopSender)),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: the API under `/api`, with request
/// tracing.
pub fn app<S: LedgerStore + 'static>(front: Arc<Storefront<S>>) -> Router {
  Router::new()
    .nest("/api", arcade_api::api_router(front))
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
  use rust_decimal::Decimal;
  use serde_json::Value;
  use tokio::net::TcpListener;

  use super::*;

  fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
    let mut builder = config::Config::builder();
    for (k, v) in pairs {
      builder = builder.set_override(*k, *v).unwrap();
    }
    builder.build().unwrap().try_deserialize().unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = config_from(&[]);
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.commerce(), CommerceConfig::default());
    assert!(cfg.notify_relay_url.is_none());
  }

  #[test]
  fn tax_rate_and_batch_come_from_config() {
    let cfg = config_from(&[("tax_rate", "0.06"), ("drain_batch", "25")]);
    assert_eq!(cfg.tax_rate.value(), Decimal::new(6, 2));
    assert_eq!(cfg.drain_batch, 25);
  }

  #[test]
  fn out_of_range_tax_rate_is_rejected() {
    let result = config::Config::builder()
      .set_override("tax_rate", "1.5")
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize::<ServerConfig>();
    assert!(result.is_err());
  }

  type Inbox = Arc<Mutex<Vec<Value>>>;

  async fn relay(inbox: Inbox, status: StatusCode) -> String {
    async fn accept(
      State((inbox, status)): State<(Inbox, StatusCode)>,
      Json(body): Json<Value>,
    ) -> StatusCode {
      inbox.lock().unwrap().push(body);
      status
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/send", post(accept)).with_state((inbox, status));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/send")
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn relay_sender_posts_the_message() {
    let inbox = Inbox::default();
    let url = relay(inbox.clone(), StatusCode::ACCEPTED).await;
    let sender = RelaySender::new(&url, "store@arcade.example").unwrap();

    tokio::task::spawn_blocking(move || {
      sender.send_invoice_email("alice@example.com", "Arcade Store Invoice", "<p>hi</p>")
    })
    .await
    .unwrap()
    .unwrap();

    let inbox = inbox.lock().unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["to"], "alice@example.com");
    assert_eq!(inbox[0]["from"], "store@arcade.example");
    assert_eq!(inbox[0]["html"], "<p>hi</p>");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn relay_rejection_is_an_error() {
    let url = relay(Inbox::default(), StatusCode::SERVICE_UNAVAILABLE).await;
    let sender = RelaySender::new(&url, "store@arcade.example").unwrap();

    let result = tokio::task::spawn_blocking(move || sender.send_invoice_email("a@b.c", "s", "b"))
      .await
      .unwrap();
    assert!(result.is_err());
  }

  #[test]
  fn malformed_relay_url_is_rejected() {
    let err = RelaySender::new("not a url", "x").err();
    assert!(matches!(err, Some(Error::InvalidRelayUrl { .. })));
  }
}
