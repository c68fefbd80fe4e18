//! Custody document entity model.

use serde::Serialize;
use sqlx::FromRow;

use reloop_core::types::{DbId, Timestamp};

/// Document type for the chain-of-custody record generated at warehouse
/// intake.
pub const DOC_TYPE_CUSTODY: &str = "custody";

/// A row from the `custody_documents` table.
///
/// At most one document of a given type exists per Job (unique index);
/// regeneration returns the existing row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CustodyDocument {
    pub id: DbId,
    pub job_id: DbId,
    pub doc_type: String,
    pub storage_key: String,
    pub size_bytes: i64,
    pub generated_by: DbId,
    pub created_at: Timestamp,
}
