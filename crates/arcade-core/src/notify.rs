//! Outbound notifications.

use crate::error::BoxError;

/// Delivers rendered emails.
///
/// Called synchronously from inside the purchase transaction: a failed send
/// aborts the purchase.
pub trait NotificationSender: Send + Sync {
  fn send_invoice_email(
    &self,
    to: &str,
    subject: &str,
    html_body: &str,
  ) -> Result<(), BoxError>;
}

/// Sender used when notifications are disabled. Accepts and drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSender;

impl NotificationSender for NoopSender {
  fn send_invoice_email(&self, to: &str, _subject: &str, _html_body: &str) -> Result<(), BoxError> {
    tracing::debug!(to, "notifications disabled, dropping invoice email");
    Ok(())
  }
}
