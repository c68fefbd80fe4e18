//! Status history entity model.

use serde::Serialize;
use sqlx::FromRow;

use reloop_core::types::{DbId, Timestamp};

/// A row from the `status_history` table.
///
/// Shared by bookings and jobs, discriminated by `entity_type`
/// (`"booking"` | `"job"`). Append-only audit trail.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusHistoryEntry {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub status: String,
    pub actor_id: DbId,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}
