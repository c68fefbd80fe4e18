//! Booking entity model.

use serde::Serialize;
use sqlx::FromRow;

use reloop_core::status::BookingStatus;
use reloop_core::types::{DbId, Timestamp};
use reloop_core::CoreError;

/// A row from the `bookings` table.
///
/// Stage timestamps (`scheduled_at` through `completed_at`) are
/// first-write-wins: set by the transition write if previously NULL,
/// never overwritten.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub booking_number: String,
    pub status: String,
    pub scheduled_date: Option<chrono::NaiveDate>,
    pub client_id: DbId,
    pub driver_id: Option<DbId>,
    pub job_id: Option<DbId>,
    pub scheduled_at: Option<Timestamp>,
    pub collected_at: Option<Timestamp>,
    pub sanitised_at: Option<Timestamp>,
    pub graded_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// The typed status. Fails only on a corrupted row.
    pub fn status(&self) -> Result<BookingStatus, CoreError> {
        BookingStatus::parse(&self.status)
    }
}
