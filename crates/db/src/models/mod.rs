//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct
//! matching the database row, with typed accessors for status columns
//! stored as TEXT.

pub mod booking;
pub mod document;
pub mod event;
pub mod evidence;
pub mod job;
pub mod notification;
pub mod status_history;

pub use booking::Booking;
pub use document::{CustodyDocument, DOC_TYPE_CUSTODY};
pub use event::WorkflowEventRow;
pub use evidence::EvidenceRecord;
pub use job::{Job, JobLineItem};
pub use notification::NotificationRecord;
pub use status_history::StatusHistoryEntry;
