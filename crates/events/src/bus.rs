//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`WorkflowEvent`]s. The
//! orchestrator publishes exactly one event per status actually changed;
//! any collaborator may subscribe without the orchestrator knowing about
//! it. It is designed to be shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use reloop_core::milestone::Milestone;
use reloop_core::types::{DbId, EntityKind};

// ---------------------------------------------------------------------------
// WorkflowEvent
// ---------------------------------------------------------------------------

/// A milestone reached by a Booking or Job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// The milestone this event announces.
    pub milestone: Milestone,

    /// Which entity changed.
    pub entity_kind: EntityKind,

    /// The entity's database id.
    pub entity_id: DbId,

    /// Status before the change, as stored (`None` for creation events).
    pub old_status: Option<String>,

    /// Status after the change, as stored.
    pub new_status: String,

    /// The user that triggered the change.
    pub actor_id: DbId,

    /// When the change was committed (UTC).
    pub timestamp: DateTime<Utc>,
}

impl WorkflowEvent {
    /// Create an event for a committed status change.
    pub fn new(
        milestone: Milestone,
        entity_kind: EntityKind,
        entity_id: DbId,
        old_status: Option<&str>,
        new_status: &str,
        actor_id: DbId,
    ) -> Self {
        Self {
            milestone,
            entity_kind,
            entity_id,
            old_status: old_status.map(str::to_string),
            new_status: new_status.to_string(),
            actor_id,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`WorkflowEvent`].
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the status change it records has already been committed.
    pub fn publish(&self, event: WorkflowEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(WorkflowEvent::new(
            Milestone::GoodsReceived,
            EntityKind::Job,
            42,
            Some("collected"),
            "warehouse",
            7,
        ));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.milestone, Milestone::GoodsReceived);
        assert_eq!(received.entity_kind, EntityKind::Job);
        assert_eq!(received.entity_id, 42);
        assert_eq!(received.old_status.as_deref(), Some("collected"));
        assert_eq!(received.new_status, "warehouse");
        assert_eq!(received.actor_id, 7);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(WorkflowEvent::new(
            Milestone::StatusChanged,
            EntityKind::Booking,
            1,
            Some("pending"),
            "created",
            2,
        ));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.new_status, "created");
        assert_eq!(e2.new_status, "created");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        // No subscribers; this must not panic.
        bus.publish(WorkflowEvent::new(
            Milestone::StatusChanged,
            EntityKind::Job,
            9,
            None,
            "booked",
            1,
        ));
    }
}
