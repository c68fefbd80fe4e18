//! Repository for the `custody_documents` table.

use sqlx::PgPool;

use reloop_core::types::DbId;

use crate::models::document::CustodyDocument;

/// Column list for `custody_documents` queries.
const COLUMNS: &str = "id, job_id, doc_type, storage_key, size_bytes, generated_by, created_at";

/// Provides insert/read operations for custody documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Find the document of the given type for a job, if one exists.
    pub async fn find_for_job(
        pool: &PgPool,
        job_id: DbId,
        doc_type: &str,
    ) -> Result<Option<CustodyDocument>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM custody_documents WHERE job_id = $1 AND doc_type = $2");
        sqlx::query_as::<_, CustodyDocument>(&query)
            .bind(job_id)
            .bind(doc_type)
            .fetch_optional(pool)
            .await
    }

    /// Insert a document record unless one of this type already exists for
    /// the job.
    ///
    /// Returns `None` when the unique `(job_id, doc_type)` key already
    /// holds a row; the caller then re-reads the existing record. This is
    /// what closes the near-simultaneous-intake race.
    pub async fn insert_once(
        pool: &PgPool,
        job_id: DbId,
        doc_type: &str,
        storage_key: &str,
        size_bytes: i64,
        generated_by: DbId,
    ) -> Result<Option<CustodyDocument>, sqlx::Error> {
        let query = format!(
            "INSERT INTO custody_documents (job_id, doc_type, storage_key, size_bytes, generated_by) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (job_id, doc_type) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CustodyDocument>(&query)
            .bind(job_id)
            .bind(doc_type)
            .bind(storage_key)
            .bind(size_bytes)
            .bind(generated_by)
            .fetch_optional(pool)
            .await
    }
}
