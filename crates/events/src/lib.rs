//! Reloop milestone event bus and notification delivery infrastructure.
//!
//! Building blocks for the workflow-wide event stream:
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`WorkflowEvent`]: the canonical milestone event envelope
//!   (entity, old status, new status, actor, timestamp).
//! - [`EventPersistence`]: background service that durably writes every
//!   event to the `workflow_events` audit table.
//! - [`delivery`]: the [`NotificationSender`] seam with SMTP and
//!   tracing-backed implementations.

pub mod bus;
pub mod delivery;
pub mod persistence;

pub use bus::{EventBus, WorkflowEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailSender};
pub use delivery::{DeliveryError, LogSender, NotificationSender};
pub use persistence::EventPersistence;
