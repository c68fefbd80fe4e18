//! Repository for the `workflow_events` audit table.

use sqlx::PgPool;

use reloop_core::types::DbId;

use crate::models::event::WorkflowEventRow;

/// Column list for `workflow_events` queries.
const COLUMNS: &str =
    "id, milestone, entity_type, entity_id, old_status, new_status, actor_id, created_at";

/// Provides insert/read operations for the milestone audit stream.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert(
        pool: &PgPool,
        milestone: &str,
        entity_type: &str,
        entity_id: DbId,
        old_status: Option<&str>,
        new_status: &str,
        actor_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO workflow_events \
                (milestone, entity_type, entity_id, old_status, new_status, actor_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(milestone)
        .bind(entity_type)
        .bind(entity_id)
        .bind(old_status)
        .bind(new_status)
        .bind(actor_id)
        .fetch_one(pool)
        .await
    }

    /// List the events recorded for one entity, oldest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<WorkflowEventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_events \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, WorkflowEventRow>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
