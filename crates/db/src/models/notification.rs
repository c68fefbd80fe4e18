//! Notification entity model.

use serde::Serialize;
use sqlx::FromRow;

use reloop_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
///
/// The unique key over `(entity_type, entity_id, milestone, role,
/// recipient_id)` is the exactly-once guard: a logical milestone can only
/// ever produce one notification per recipient role, regardless of how
/// many call sites fire it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationRecord {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub milestone: String,
    pub role: String,
    pub recipient_id: DbId,
    pub title: String,
    pub message: String,
    pub link: String,
    pub created_at: Timestamp,
}
