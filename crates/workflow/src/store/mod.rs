//! Storage seam for the workflow engine.
//!
//! Everything the orchestrator persists goes through [`WorkflowStore`].
//! Both implementations, [`pg::PgStore`] and [`memory::MemoryStore`],
//! uphold the same contract:
//!
//! - `transition_*` writes are atomic read-validate-write units guarded
//!   by the expected current status; `Ok(false)` means a concurrent
//!   writer changed the status first. The write also appends the history
//!   entry and stamps stage timestamps first-write-wins.
//! - `insert_evidence` fails with `DuplicateEvidence` on the second
//!   record for a `(job, status)` pair, enforced at insertion.
//! - `insert_notification_once` / `insert_document_once` return `None`
//!   instead of inserting when the logical key already holds a row.

pub mod memory;
pub mod pg;

use async_trait::async_trait;

use reloop_core::evidence::NewEvidence;
use reloop_core::milestone::{Milestone, Role};
use reloop_core::status::{BookingStatus, JobStatus};
use reloop_core::types::{DbId, EntityKind};
use reloop_core::CoreError;
use reloop_db::models::{
    Booking, CustodyDocument, EvidenceRecord, Job, JobLineItem, NotificationRecord,
    StatusHistoryEntry,
};

/// A notification to record and deliver.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub entity_kind: EntityKind,
    pub entity_id: DbId,
    pub milestone: Milestone,
    pub role: Role,
    pub recipient_id: DbId,
    pub title: String,
    pub message: String,
    pub link: String,
}

/// Persistence operations required by the workflow engine.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    // -----------------------------------------------------------------------
    // Bookings & jobs
    // -----------------------------------------------------------------------

    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, CoreError>;

    async fn find_job(&self, id: DbId) -> Result<Option<Job>, CoreError>;

    async fn find_job_by_booking(&self, booking_id: DbId) -> Result<Option<Job>, CoreError>;

    async fn create_booking(
        &self,
        booking_number: &str,
        client_id: DbId,
        scheduled_date: Option<chrono::NaiveDate>,
    ) -> Result<Booking, CoreError>;

    /// Create the job for a booking in `booked` status. A creation race
    /// resolves to the existing job (one job per booking).
    async fn create_job_for_booking(
        &self,
        job_reference: &str,
        booking_id: DbId,
        driver_id: Option<DbId>,
    ) -> Result<Job, CoreError>;

    /// Record the booking→job link. The link is write-once.
    async fn link_booking_job(&self, booking_id: DbId, job_id: DbId) -> Result<(), CoreError>;

    async fn set_booking_driver(&self, booking_id: DbId, driver_id: DbId)
        -> Result<(), CoreError>;

    async fn set_job_driver(&self, job_id: DbId, driver_id: DbId) -> Result<(), CoreError>;

    /// Atomically move a booking from `expected` to `new_status`, stamp
    /// the stage timestamp if unset, and append the history entry.
    ///
    /// Returns `false` when the stored status no longer equals `expected`.
    async fn transition_booking(
        &self,
        id: DbId,
        expected: BookingStatus,
        new_status: BookingStatus,
        actor_id: DbId,
        notes: Option<&str>,
    ) -> Result<bool, CoreError>;

    /// Job counterpart of [`transition_booking`](Self::transition_booking).
    async fn transition_job(
        &self,
        id: DbId,
        expected: JobStatus,
        new_status: JobStatus,
        actor_id: DbId,
        notes: Option<&str>,
    ) -> Result<bool, CoreError>;

    async fn list_status_history(
        &self,
        kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<StatusHistoryEntry>, CoreError>;

    // -----------------------------------------------------------------------
    // Line items
    // -----------------------------------------------------------------------

    async fn add_line_item(
        &self,
        job_id: DbId,
        category: &str,
        quantity: i32,
    ) -> Result<JobLineItem, CoreError>;

    async fn list_line_items(&self, job_id: DbId) -> Result<Vec<JobLineItem>, CoreError>;

    async fn find_line_item(&self, line_id: DbId) -> Result<Option<JobLineItem>, CoreError>;

    /// Set-once sanitisation write; `Ok(false)` when already sanitised.
    async fn mark_line_sanitised(
        &self,
        line_id: DbId,
        wipe_method: &str,
    ) -> Result<bool, CoreError>;

    /// Set-once grading write; `Ok(false)` when already graded.
    async fn set_line_grade(
        &self,
        line_id: DbId,
        grade: &str,
        resale_value_pence: i64,
    ) -> Result<bool, CoreError>;

    async fn unsanitised_count(&self, job_id: DbId) -> Result<i64, CoreError>;

    async fn ungraded_count(&self, job_id: DbId) -> Result<i64, CoreError>;

    // -----------------------------------------------------------------------
    // Evidence
    // -----------------------------------------------------------------------

    /// Insert a cleaned evidence record. Fails with
    /// [`CoreError::DuplicateEvidence`] when a record already exists for
    /// the `(job, status)` pair.
    async fn insert_evidence(
        &self,
        job_id: DbId,
        status: JobStatus,
        evidence: &NewEvidence,
        submitted_by: DbId,
    ) -> Result<EvidenceRecord, CoreError>;

    async fn list_evidence(&self, job_id: DbId) -> Result<Vec<EvidenceRecord>, CoreError>;

    async fn find_evidence(
        &self,
        job_id: DbId,
        status: JobStatus,
    ) -> Result<Option<EvidenceRecord>, CoreError>;

    // -----------------------------------------------------------------------
    // Notifications & documents
    // -----------------------------------------------------------------------

    /// Record a notification unless its logical key already exists.
    async fn insert_notification_once(
        &self,
        notification: &NewNotification,
    ) -> Result<Option<DbId>, CoreError>;

    async fn list_notifications(
        &self,
        kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<NotificationRecord>, CoreError>;

    async fn find_document(
        &self,
        job_id: DbId,
        doc_type: &str,
    ) -> Result<Option<CustodyDocument>, CoreError>;

    /// Record a document unless one of this type already exists for the
    /// job. `None` means another writer got there first; re-read.
    async fn insert_document_once(
        &self,
        job_id: DbId,
        doc_type: &str,
        storage_key: &str,
        size_bytes: i64,
        generated_by: DbId,
    ) -> Result<Option<CustodyDocument>, CoreError>;
}

/// The stage-timestamp column a booking transition stamps, if any.
pub(crate) fn booking_stage_column(status: BookingStatus) -> Option<&'static str> {
    match status {
        BookingStatus::Scheduled => Some("scheduled_at"),
        BookingStatus::Collected => Some("collected_at"),
        BookingStatus::Sanitised => Some("sanitised_at"),
        BookingStatus::Graded => Some("graded_at"),
        BookingStatus::Completed => Some("completed_at"),
        _ => None,
    }
}
