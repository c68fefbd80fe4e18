//! Postgres persistence for the reloop workflow.
//!
//! Models are plain `FromRow` structs matching their table rows;
//! repositories are zero-sized structs with async methods. Uniqueness
//! invariants (one evidence record per `(job_id, status)`, one custody
//! document per `(job_id, doc_type)`, one notification per logical
//! milestone/recipient) live in the schema, not in application checks.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}
