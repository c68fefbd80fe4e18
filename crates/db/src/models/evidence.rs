//! Evidence record entity model.

use serde::Serialize;
use sqlx::FromRow;

use reloop_core::types::{DbId, Timestamp};

/// A row from the `evidence_records` table.
///
/// Write-once: there is no update or delete path for evidence, in code or
/// in the repository. The `(job_id, status)` pair is unique.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EvidenceRecord {
    pub id: DbId,
    pub job_id: DbId,
    pub status: String,
    pub photo_keys: Vec<String>,
    pub signature_key: Option<String>,
    pub seal_numbers: Vec<String>,
    pub notes: Option<String>,
    pub submitted_by: DbId,
    pub created_at: Timestamp,
}
