//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every received [`WorkflowEvent`] to the
//! `workflow_events` audit table. It runs as a long-lived background task
//! and shuts down gracefully when the bus sender is dropped.

use tokio::sync::broadcast;

use reloop_core::types::DbId;
use reloop_db::repositories::EventRepo;
use reloop_db::DbPool;

use crate::bus::WorkflowEvent;

/// Background service that persists workflow events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop.
    ///
    /// Subscribes to the event bus via the provided `receiver` and persists
    /// every event it receives. The loop exits when the channel is closed
    /// (i.e. the [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<WorkflowEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            milestone = %event.milestone,
                            entity_id = event.entity_id,
                            "Failed to persist workflow event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event to the `workflow_events` table.
    async fn persist(pool: &DbPool, event: &WorkflowEvent) -> Result<DbId, sqlx::Error> {
        EventRepo::insert(
            pool,
            event.milestone.as_str(),
            event.entity_kind.as_str(),
            event.entity_id,
            event.old_status.as_deref(),
            &event.new_status,
            event.actor_id,
        )
        .await
    }
}
