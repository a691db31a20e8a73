//! [`RelaySender`]: delivers invoice emails through an HTTP mail relay.
//!
//! The relay receives one JSON document per message:
//!
//! ```json
//! {"from": "...", "to": "...", "subject": "...", "html": "..."}
//! ```
//!
//! and answers any 2xx status once it has accepted it.

use std::time::Duration;

use arcade_core::{error::BoxError, notify::NotificationSender};
use reqwest::{Client, Url};
use serde::Serialize;
use tokio::runtime::Handle;

use crate::error::Error;

#[derive(Serialize)]
struct RelayMessage<'a> {
  from:    &'a str,
  to:      &'a str,
  subject: &'a str,
  html:    &'a str,
}

/// Posts rendered emails to a mail relay.
///
/// [`NotificationSender`] is a blocking interface called from the store's
/// connection thread, so each send is driven to completion on the runtime
/// captured at construction. It must not be called from a runtime worker.
pub struct RelaySender {
  client: Client,
  handle: Handle,
  url:    Url,
  from:   String,
}

impl RelaySender {
  /// Build a sender for `url`. Must be called from within a tokio runtime.
  pub fn new(url: &str, from: impl Into<String>) -> Result<Self, Error> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidRelayUrl {
      url:    url.to_owned(),
      reason: e.to_string(),
    })?;
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    let handle = Handle::try_current()?;
    Ok(Self { client, handle, url: parsed, from: from.into() })
  }

  async fn post(&self, message: &RelayMessage<'_>) -> Result<(), Error> {
    let resp = self.client.post(self.url.clone()).json(message).send().await?;
    if !resp.status().is_success() {
      return Err(Error::Rejected(resp.status()));
    }
    Ok(())
  }
}

impl NotificationSender for RelaySender {
  fn send_invoice_email(&self, to: &str, subject: &str, html_body: &str) -> Result<(), BoxError> {
    let message = RelayMessage { from: &self.from, to, subject, html: html_body };
    self.handle.block_on(self.post(&message))?;
    tracing::debug!(to, relay = %self.url, "invoice email handed to relay");
    Ok(())
  }
}
