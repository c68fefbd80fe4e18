//! Job and line-item entity models.

use serde::Serialize;
use sqlx::FromRow;

use reloop_core::status::JobStatus;
use reloop_core::types::{DbId, Timestamp};
use reloop_core::CoreError;

/// A row from the `jobs` table.
///
/// `booking_id` is immutable once set; the schema's unique index makes a
/// second Job for the same Booking impossible.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_reference: String,
    pub status: String,
    pub booking_id: DbId,
    pub driver_id: Option<DbId>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    /// The typed status. Fails only on a corrupted row.
    pub fn status(&self) -> Result<JobStatus, CoreError> {
        JobStatus::parse(&self.status)
    }
}

/// A row from the `job_line_items` table.
///
/// Sanitisation fields and grading fields are each written exactly once;
/// the repository's conditional updates guard against a second write.
/// `resale_value_pence` is computed at grading time and not revisited.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobLineItem {
    pub id: DbId,
    pub job_id: DbId,
    pub category: String,
    pub quantity: i32,
    pub sanitised: bool,
    pub wipe_method: Option<String>,
    pub sanitised_at: Option<Timestamp>,
    pub grade: Option<String>,
    pub graded_at: Option<Timestamp>,
    pub resale_value_pence: Option<i64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
