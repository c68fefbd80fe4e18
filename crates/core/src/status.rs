//! Booking and Job status machines.
//!
//! Each entity moves forward through a fixed sequence, one step at a time.
//! `cancelled` is reachable from any non-terminal status; `completed` and
//! `cancelled` are terminal. Self-transitions, backward transitions, and
//! skips are all rejected.
//!
//! Statuses are stored as snake_case TEXT in the database; `as_str` /
//! `parse` round-trip exactly with the serde representation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

/// Customer-facing booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Created,
    Scheduled,
    Collected,
    Sanitised,
    Graded,
    Completed,
    Cancelled,
}

/// The forward sequence for bookings, in order. `Cancelled` sits outside it.
const BOOKING_SEQUENCE: &[BookingStatus] = &[
    BookingStatus::Pending,
    BookingStatus::Created,
    BookingStatus::Scheduled,
    BookingStatus::Collected,
    BookingStatus::Sanitised,
    BookingStatus::Graded,
    BookingStatus::Completed,
];

impl BookingStatus {
    /// All statuses, including `Cancelled`.
    pub const ALL: &'static [BookingStatus] = &[
        BookingStatus::Pending,
        BookingStatus::Created,
        BookingStatus::Scheduled,
        BookingStatus::Collected,
        BookingStatus::Sanitised,
        BookingStatus::Graded,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    /// Stable string form, matching the `bookings.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Created => "created",
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Collected => "collected",
            BookingStatus::Sanitised => "sanitised",
            BookingStatus::Graded => "graded",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown booking status '{s}'")))
    }

    /// The next status in the forward sequence, if any.
    pub fn successor(&self) -> Option<BookingStatus> {
        let idx = BOOKING_SEQUENCE.iter().position(|v| v == self)?;
        BOOKING_SEQUENCE.get(idx + 1).copied()
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Position in the forward sequence. `Cancelled` has no ordinal.
    pub fn ordinal(&self) -> Option<usize> {
        BOOKING_SEQUENCE.iter().position(|v| v == self)
    }

    /// Whether `self` sits at or beyond `other` in the forward sequence.
    ///
    /// Returns `false` whenever either side is `Cancelled`; cancellation
    /// is not ordered relative to the forward sequence.
    pub fn is_at_or_past(&self, other: BookingStatus) -> bool {
        match (self.ordinal(), other.ordinal()) {
            (Some(a), Some(b)) => a >= b,
            _ => *self == other,
        }
    }

    /// Whether the transition `self -> requested` is legal.
    ///
    /// Legal moves are the single forward step and cancellation from any
    /// non-terminal status.
    pub fn is_valid_transition(&self, requested: BookingStatus) -> bool {
        if requested == BookingStatus::Cancelled {
            return !self.is_terminal();
        }
        self.successor() == Some(requested)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Operations-facing job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Booked,
    Routed,
    EnRoute,
    Arrived,
    Collected,
    Warehouse,
    Sanitised,
    Graded,
    Completed,
    Cancelled,
}

/// The forward sequence for jobs, in order. `Cancelled` sits outside it.
const JOB_SEQUENCE: &[JobStatus] = &[
    JobStatus::Booked,
    JobStatus::Routed,
    JobStatus::EnRoute,
    JobStatus::Arrived,
    JobStatus::Collected,
    JobStatus::Warehouse,
    JobStatus::Sanitised,
    JobStatus::Graded,
    JobStatus::Completed,
];

impl JobStatus {
    /// All statuses, including `Cancelled`.
    pub const ALL: &'static [JobStatus] = &[
        JobStatus::Booked,
        JobStatus::Routed,
        JobStatus::EnRoute,
        JobStatus::Arrived,
        JobStatus::Collected,
        JobStatus::Warehouse,
        JobStatus::Sanitised,
        JobStatus::Graded,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    /// Stable string form, matching the `jobs.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Booked => "booked",
            JobStatus::Routed => "routed",
            JobStatus::EnRoute => "en_route",
            JobStatus::Arrived => "arrived",
            JobStatus::Collected => "collected",
            JobStatus::Warehouse => "warehouse",
            JobStatus::Sanitised => "sanitised",
            JobStatus::Graded => "graded",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown job status '{s}'")))
    }

    /// The next status in the forward sequence, if any.
    pub fn successor(&self) -> Option<JobStatus> {
        let idx = JOB_SEQUENCE.iter().position(|v| v == self)?;
        JOB_SEQUENCE.get(idx + 1).copied()
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// Position in the forward sequence. `Cancelled` has no ordinal.
    pub fn ordinal(&self) -> Option<usize> {
        JOB_SEQUENCE.iter().position(|v| v == self)
    }

    /// Whether `self` sits at or beyond `other` in the forward sequence.
    pub fn is_at_or_past(&self, other: JobStatus) -> bool {
        match (self.ordinal(), other.ordinal()) {
            (Some(a), Some(b)) => a >= b,
            _ => *self == other,
        }
    }

    /// Whether the transition `self -> requested` is legal.
    pub fn is_valid_transition(&self, requested: JobStatus) -> bool {
        if requested == JobStatus::Cancelled {
            return !self.is_terminal();
        }
        self.successor() == Some(requested)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
