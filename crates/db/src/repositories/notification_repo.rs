//! Repository for the `notifications` table.

use sqlx::PgPool;

use reloop_core::types::DbId;

use crate::models::notification::NotificationRecord;

/// Column list for `notifications` queries.
const COLUMNS: &str = "\
    id, entity_type, entity_id, milestone, role, recipient_id, title, \
    message, link, created_at";

/// Provides insert/read operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a notification unless the same logical milestone was already
    /// recorded for this recipient role.
    ///
    /// Returns the generated ID, or `None` when the unique key
    /// `(entity_type, entity_id, milestone, role, recipient_id)` already
    /// holds a row, the exactly-once case.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_once(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        milestone: &str,
        role: &str,
        recipient_id: DbId,
        title: &str,
        message: &str,
        link: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications \
                (entity_type, entity_id, milestone, role, recipient_id, title, message, link) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (entity_type, entity_id, milestone, role, recipient_id) DO NOTHING \
             RETURNING id",
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(milestone)
        .bind(role)
        .bind(recipient_id)
        .bind(title)
        .bind(message)
        .bind(link)
        .fetch_optional(pool)
        .await
    }

    /// List the notifications recorded for one entity, oldest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<NotificationRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, NotificationRecord>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
