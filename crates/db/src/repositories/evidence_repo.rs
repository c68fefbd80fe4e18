//! Repository for the `evidence_records` table.
//!
//! Insert and read only. Evidence is immutable by design; no update or
//! delete method exists here and none should be added.

use sqlx::PgPool;

use reloop_core::types::DbId;

use crate::models::evidence::EvidenceRecord;

/// Column list for `evidence_records` queries.
const COLUMNS: &str = "\
    id, job_id, status, photo_keys, signature_key, seal_numbers, notes, \
    submitted_by, created_at";

/// Provides insert/read operations for evidence records.
pub struct EvidenceRepo;

impl EvidenceRepo {
    /// Insert a new evidence record.
    ///
    /// The unique index on `(job_id, status)` is the duplicate guard; a
    /// second submission for the same pair surfaces as a unique-violation
    /// database error for the caller to map.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        pool: &PgPool,
        job_id: DbId,
        status: &str,
        photo_keys: &[String],
        signature_key: Option<&str>,
        seal_numbers: &[String],
        notes: Option<&str>,
        submitted_by: DbId,
    ) -> Result<EvidenceRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO evidence_records \
                (job_id, status, photo_keys, signature_key, seal_numbers, notes, submitted_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EvidenceRecord>(&query)
            .bind(job_id)
            .bind(status)
            .bind(photo_keys)
            .bind(signature_key)
            .bind(seal_numbers)
            .bind(notes)
            .bind(submitted_by)
            .fetch_one(pool)
            .await
    }

    /// List all evidence records for a job, oldest first.
    pub async fn list_for_job(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Vec<EvidenceRecord>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM evidence_records WHERE job_id = $1 ORDER BY created_at");
        sqlx::query_as::<_, EvidenceRecord>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Find the evidence record for a specific job status, if present.
    pub async fn find_for_status(
        pool: &PgPool,
        job_id: DbId,
        status: &str,
    ) -> Result<Option<EvidenceRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM evidence_records WHERE job_id = $1 AND status = $2");
        sqlx::query_as::<_, EvidenceRecord>(&query)
            .bind(job_id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }
}
