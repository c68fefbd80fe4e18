//! Domain rules for reloop asset collections.
//!
//! Pure types and tables with no I/O: booking and job status machines,
//! the status mappers that keep the pair consistent, milestone and
//! notification-routing tables, evidence content rules, and line-item
//! constants. Everything here is synchronous and fully unit-tested; the
//! storage and orchestration crates build on top.

pub mod error;
pub mod evidence;
pub mod line_item;
pub mod milestone;
pub mod status;
pub mod status_map;
pub mod types;

pub use error::CoreError;
pub use status::{BookingStatus, JobStatus};
pub use types::{DbId, EntityKind, Timestamp};
