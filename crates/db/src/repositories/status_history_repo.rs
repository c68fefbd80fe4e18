//! Repository for the `status_history` table. Append and read only.

use sqlx::{PgConnection, PgPool};

use reloop_core::types::DbId;

use crate::models::status_history::StatusHistoryEntry;

/// Column list for `status_history` queries.
const COLUMNS: &str = "id, entity_type, entity_id, status, actor_id, notes, created_at";

/// Provides append/read operations for the status audit trail.
pub struct StatusHistoryRepo;

impl StatusHistoryRepo {
    /// Append a history entry, returning the generated ID.
    ///
    /// Takes a connection so the append can share the transaction of the
    /// status write it records.
    pub async fn append(
        conn: &mut PgConnection,
        entity_type: &str,
        entity_id: DbId,
        status: &str,
        actor_id: DbId,
        notes: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO status_history (entity_type, entity_id, status, actor_id, notes) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(status)
        .bind(actor_id)
        .bind(notes)
        .fetch_one(conn)
        .await
    }

    /// List the history of one entity, oldest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM status_history \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, StatusHistoryEntry>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
