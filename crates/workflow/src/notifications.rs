//! Milestone notification dispatch.
//!
//! Turns a committed [`WorkflowEvent`] into per-role notification rows
//! and best-effort deliveries. The store's logical key makes recording
//! exactly-once; delivery failures are logged and never propagate into
//! the workflow that triggered them.

use std::sync::Arc;
use std::time::Duration;

use reloop_core::milestone::{roles_to_notify, Milestone, Role};
use reloop_core::types::{DbId, EntityKind};
use reloop_db::models::{Booking, Job};
use reloop_events::bus::WorkflowEvent;
use reloop_events::delivery::NotificationSender;

use crate::store::{NewNotification, WorkflowStore};

/// Recipient directory for the roles that are not on the entities
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    pub admin_ids: Vec<DbId>,
    pub reseller_ids: Vec<DbId>,
}

/// Default cap on a single delivery call.
const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Fans a workflow event out to the roles its milestone concerns.
pub struct NotificationDispatcher {
    store: Arc<dyn WorkflowStore>,
    sender: Arc<dyn NotificationSender>,
    config: DispatcherConfig,
    delivery_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        sender: Arc<dyn NotificationSender>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            store,
            sender,
            config,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Record and deliver notifications for a committed event.
    ///
    /// `booking` and `job` carry whichever entities the caller already
    /// has loaded; role resolution uses them for client and driver ids.
    /// Never fails: a notification problem must not unwind a status
    /// change that already committed.
    pub async fn dispatch(
        &self,
        event: &WorkflowEvent,
        booking: Option<&Booking>,
        job: Option<&Job>,
    ) {
        let roles = roles_to_notify(event.entity_kind, &event.new_status, event.milestone);
        for role in roles {
            for recipient_id in self.resolve_recipients(*role, booking, job) {
                self.dispatch_one(event, *role, recipient_id).await;
            }
        }
    }

    async fn dispatch_one(&self, event: &WorkflowEvent, role: Role, recipient_id: DbId) {
        let (title, message) = render(event);
        let notification = NewNotification {
            entity_kind: event.entity_kind,
            entity_id: event.entity_id,
            milestone: event.milestone,
            role,
            recipient_id,
            title,
            message,
            link: entity_link(event.entity_kind, event.entity_id),
        };
        match self.store.insert_notification_once(&notification).await {
            Ok(Some(id)) => {
                // The dispatcher runs inline on the status-change path, so a
                // stalled sender must never hold the workflow hostage.
                let delivery = tokio::time::timeout(
                    self.delivery_timeout,
                    self.sender.deliver(
                        recipient_id,
                        &notification.title,
                        &notification.message,
                        &notification.link,
                    ),
                )
                .await;
                match delivery {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(
                            notification_id = id,
                            recipient_id,
                            error = %err,
                            "Notification recorded but delivery failed"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            notification_id = id,
                            recipient_id,
                            timeout_ms = self.delivery_timeout.as_millis() as u64,
                            "Notification recorded but delivery timed out"
                        );
                    }
                }
            }
            Ok(None) => {
                tracing::debug!(
                    entity_id = event.entity_id,
                    milestone = %event.milestone,
                    role = %role,
                    recipient_id,
                    "Notification already sent, skipping"
                );
            }
            Err(err) => {
                tracing::warn!(
                    entity_id = event.entity_id,
                    milestone = %event.milestone,
                    error = %err,
                    "Failed to record notification"
                );
            }
        }
    }

    fn resolve_recipients(
        &self,
        role: Role,
        booking: Option<&Booking>,
        job: Option<&Job>,
    ) -> Vec<DbId> {
        match role {
            Role::Client => booking.map(|b| b.client_id).into_iter().collect(),
            Role::Driver => job
                .and_then(|j| j.driver_id)
                .or_else(|| booking.and_then(|b| b.driver_id))
                .into_iter()
                .collect(),
            Role::Admin => self.config.admin_ids.clone(),
            Role::Reseller => self.config.reseller_ids.clone(),
        }
    }
}

fn entity_link(kind: EntityKind, id: DbId) -> String {
    match kind {
        EntityKind::Booking => format!("/bookings/{id}"),
        EntityKind::Job => format!("/jobs/{id}"),
    }
}

fn render(event: &WorkflowEvent) -> (String, String) {
    let noun = match event.entity_kind {
        EntityKind::Booking => "booking",
        EntityKind::Job => "collection job",
    };
    match event.milestone {
        Milestone::DriverAssigned => (
            "Driver assigned".to_string(),
            format!("A driver has been assigned to your {noun} and collection is scheduled."),
        ),
        Milestone::DriverEnRoute => (
            "Driver en route".to_string(),
            format!("The driver for your {noun} is on the way."),
        ),
        Milestone::DriverArrived => (
            "Driver arrived".to_string(),
            format!("The driver for your {noun} has arrived on site."),
        ),
        Milestone::GoodsReceived => (
            "Goods received at warehouse".to_string(),
            format!("The assets on your {noun} have been received and checked in at the warehouse."),
        ),
        Milestone::StatusChanged => (
            format!("Status update: {}", event.new_status),
            format!("Your {noun} has moved to status '{}'.", event.new_status),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_milestones_have_dedicated_copy() {
        let event = WorkflowEvent::new(
            Milestone::GoodsReceived,
            EntityKind::Job,
            4,
            Some("arrived"),
            "warehouse",
            1,
        );
        let (title, message) = render(&event);
        assert_eq!(title, "Goods received at warehouse");
        assert!(message.contains("warehouse"));
    }

    #[test]
    fn generic_milestone_names_the_new_status() {
        let event = WorkflowEvent::new(
            Milestone::StatusChanged,
            EntityKind::Booking,
            4,
            Some("pending"),
            "created",
            1,
        );
        let (title, _) = render(&event);
        assert_eq!(title, "Status update: created");
    }

    #[test]
    fn links_point_at_the_entity() {
        assert_eq!(entity_link(EntityKind::Booking, 12), "/bookings/12");
        assert_eq!(entity_link(EntityKind::Job, 7), "/jobs/7");
    }
}
