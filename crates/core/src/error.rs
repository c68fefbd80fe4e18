use crate::types::DbId;

/// Error type shared across the workflow crates.
///
/// Validation and transition errors are returned synchronously to the
/// caller; side-effect failures (notification delivery, document
/// rendering) are logged where they occur and never surface through the
/// orchestrator as one of these.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Cannot transition {entity} from '{current}' to '{requested}'")]
    InvalidTransition {
        entity: &'static str,
        current: &'static str,
        requested: &'static str,
    },

    /// A concurrent writer changed the entity's status between our read
    /// and our conditional write. The caller may reload and retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Evidence already exists for job {job_id} at status '{status}'")]
    DuplicateEvidence { job_id: DbId, status: &'static str },

    #[error("Evidence must include at least one photo or a signature")]
    EmptyEvidence,

    #[error("Document rendering produced an empty artifact for job {job_id}")]
    EmptyDocument { job_id: DbId },

    #[error("Line item {line_id} has already been sanitised")]
    AlreadySanitised { line_id: DbId },

    #[error("Line item {line_id} has already been graded")]
    AlreadyGraded { line_id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
