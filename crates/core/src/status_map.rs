//! Cross-entity status mapping.
//!
//! The Job is the operational ground truth; the Booking is the customer
//! view. A Job status change maps onto at most one Booking status (and
//! vice versa); where no mapping exists the change is purely
//! operational and only produces notifications.

use crate::status::{BookingStatus, JobStatus};

/// Translate a Job status into the Booking status it implies, if any.
///
/// `collected` and `warehouse` both collapse onto the single customer-facing
/// `collected`; `routed` means the booking has been scheduled onto a route.
/// `booked`, `en_route` and `arrived` are operational-only.
pub fn map_job_status_to_booking(job_status: JobStatus) -> Option<BookingStatus> {
    match job_status {
        JobStatus::Routed => Some(BookingStatus::Scheduled),
        JobStatus::Collected | JobStatus::Warehouse => Some(BookingStatus::Collected),
        JobStatus::Sanitised => Some(BookingStatus::Sanitised),
        JobStatus::Graded => Some(BookingStatus::Graded),
        JobStatus::Completed => Some(BookingStatus::Completed),
        JobStatus::Cancelled => Some(BookingStatus::Cancelled),
        JobStatus::Booked | JobStatus::EnRoute | JobStatus::Arrived => None,
    }
}

/// Translate a Booking status into the Job status it implies, if any.
///
/// `collected` is special-cased: when the Job has already progressed to
/// `warehouse` or beyond, the mapping is refused so the Job is never
/// pulled backward by a Booking-side echo of an earlier stage.
pub fn map_booking_status_to_job(
    booking_status: BookingStatus,
    current_job_status: JobStatus,
) -> Option<JobStatus> {
    match booking_status {
        BookingStatus::Scheduled => Some(JobStatus::Routed),
        BookingStatus::Collected => {
            if current_job_status.is_at_or_past(JobStatus::Warehouse) {
                None
            } else {
                Some(JobStatus::Collected)
            }
        }
        BookingStatus::Sanitised => Some(JobStatus::Sanitised),
        BookingStatus::Graded => Some(JobStatus::Graded),
        BookingStatus::Completed => Some(JobStatus::Completed),
        BookingStatus::Cancelled => Some(JobStatus::Cancelled),
        BookingStatus::Pending | BookingStatus::Created => None,
    }
}
