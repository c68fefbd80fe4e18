//! Workflow orchestration for reloop asset collections.
//!
//! The [`Orchestrator`] is the sole entry point for status mutation on
//! the coupled Booking/Job pair. It validates transitions against the
//! tables in `reloop-core` and commits them through the [`WorkflowStore`]
//! seam under an optimistic-concurrency guard. A one-hop echo keeps the
//! paired entity consistent. After every commit it publishes the
//! milestone event on the bus, lets the [`NotificationDispatcher`] fan
//! out to the affected roles, and on warehouse intake asks the
//! [`DocumentService`] for the custody document.
//!
//! Storage comes in two flavours: [`PgStore`](store::pg::PgStore) for
//! production and [`MemoryStore`](store::memory::MemoryStore) for tests
//! and demos.

pub mod documents;
pub mod notifications;
pub mod orchestrator;
pub mod store;
pub mod valuation;

pub use documents::{ArtifactStore, CustodyPayload, DocumentRenderer, DocumentService, FsArtifactStore};
pub use notifications::{DispatcherConfig, NotificationDispatcher};
pub use orchestrator::{Orchestrator, StatusTarget, UpdatedEntity};
pub use store::{memory::MemoryStore, pg::PgStore, NewNotification, WorkflowStore};
pub use valuation::{FlatRateValuer, ValuationCalculator};
