//! Outbound notification delivery.
//!
//! The dispatcher records notifications durably and then hands them to a
//! [`NotificationSender`]. Delivery is best-effort: a failed send is the
//! sender's problem to log, never the workflow's; the recorded
//! notification row supports manual replay.

pub mod email;

use async_trait::async_trait;

use reloop_core::types::DbId;

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The recipient has no known delivery address.
    #[error("No delivery address for recipient {0}")]
    UnknownRecipient(DbId),

    /// Transport-level failure.
    #[error("Delivery transport error: {0}")]
    Transport(String),
}

/// Delivers a single notification to a recipient.
///
/// Implementations must be bounded in time; the dispatcher treats every
/// call as best-effort and will not retry.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn deliver(
        &self,
        recipient_id: DbId,
        title: &str,
        message: &str,
        link: &str,
    ) -> Result<(), DeliveryError>;
}

/// Sender that only logs, for deployments without an outbound channel
/// configured.
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn deliver(
        &self,
        recipient_id: DbId,
        title: &str,
        _message: &str,
        link: &str,
    ) -> Result<(), DeliveryError> {
        tracing::info!(recipient_id, title, link, "Notification (log delivery)");
        Ok(())
    }
}
