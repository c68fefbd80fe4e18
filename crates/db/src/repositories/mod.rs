//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (reads and standalone writes) or `&mut PgConnection`
//! (writes that participate in a caller-owned transaction, i.e. the
//! guarded status transitions and their history append).

pub mod booking_repo;
pub mod document_repo;
pub mod event_repo;
pub mod evidence_repo;
pub mod job_repo;
pub mod notification_repo;
pub mod status_history_repo;

pub use booking_repo::BookingRepo;
pub use document_repo::DocumentRepo;
pub use event_repo::EventRepo;
pub use evidence_repo::EvidenceRepo;
pub use job_repo::JobRepo;
pub use notification_repo::NotificationRepo;
pub use status_history_repo::StatusHistoryRepo;
