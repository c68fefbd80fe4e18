//! Workflow event audit entity model.

use serde::Serialize;
use sqlx::FromRow;

use reloop_core::types::{DbId, Timestamp};

/// A row from the `workflow_events` table.
///
/// One row per milestone published on the event bus; written by the
/// persistence subscriber, retained for audit.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowEventRow {
    pub id: DbId,
    pub milestone: String,
    pub entity_type: String,
    pub entity_id: DbId,
    pub old_status: Option<String>,
    pub new_status: String,
    pub actor_id: DbId,
    pub created_at: Timestamp,
}
