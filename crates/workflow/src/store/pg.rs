//! Postgres-backed [`WorkflowStore`].
//!
//! Thin orchestration over the `reloop-db` repositories. Transitions run
//! in a transaction so the guarded status write and its history entry
//! commit as a unit; unique-violation errors on evidence insertion are
//! mapped to the domain's `DuplicateEvidence`.

use async_trait::async_trait;

use reloop_core::evidence::NewEvidence;
use reloop_core::status::{BookingStatus, JobStatus};
use reloop_core::types::{DbId, EntityKind};
use reloop_core::CoreError;
use reloop_db::models::{
    Booking, CustodyDocument, EvidenceRecord, Job, JobLineItem, NotificationRecord,
    StatusHistoryEntry,
};
use reloop_db::repositories::{
    BookingRepo, DocumentRepo, EvidenceRepo, JobRepo, NotificationRepo, StatusHistoryRepo,
};
use reloop_db::DbPool;

use super::{booking_stage_column, NewNotification, WorkflowStore};

/// [`WorkflowStore`] backed by a Postgres pool.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map a storage fault into the shared error type.
fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("database error: {e}"))
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, CoreError> {
        BookingRepo::find_by_id(&self.pool, id).await.map_err(db_err)
    }

    async fn find_job(&self, id: DbId) -> Result<Option<Job>, CoreError> {
        JobRepo::find_by_id(&self.pool, id).await.map_err(db_err)
    }

    async fn find_job_by_booking(&self, booking_id: DbId) -> Result<Option<Job>, CoreError> {
        JobRepo::find_by_booking(&self.pool, booking_id)
            .await
            .map_err(db_err)
    }

    async fn create_booking(
        &self,
        booking_number: &str,
        client_id: DbId,
        scheduled_date: Option<chrono::NaiveDate>,
    ) -> Result<Booking, CoreError> {
        BookingRepo::create(&self.pool, booking_number, client_id, scheduled_date)
            .await
            .map_err(db_err)
    }

    async fn create_job_for_booking(
        &self,
        job_reference: &str,
        booking_id: DbId,
        driver_id: Option<DbId>,
    ) -> Result<Job, CoreError> {
        JobRepo::create_for_booking(&self.pool, job_reference, booking_id, driver_id)
            .await
            .map_err(db_err)
    }

    async fn link_booking_job(&self, booking_id: DbId, job_id: DbId) -> Result<(), CoreError> {
        // A false return means the link was already set; the link is
        // write-once so that is not an error.
        BookingRepo::set_job(&self.pool, booking_id, job_id)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_booking_driver(
        &self,
        booking_id: DbId,
        driver_id: DbId,
    ) -> Result<(), CoreError> {
        BookingRepo::set_driver(&self.pool, booking_id, driver_id)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_job_driver(&self, job_id: DbId, driver_id: DbId) -> Result<(), CoreError> {
        JobRepo::set_driver(&self.pool, job_id, driver_id)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn transition_booking(
        &self,
        id: DbId,
        expected: BookingStatus,
        new_status: BookingStatus,
        actor_id: DbId,
        notes: Option<&str>,
    ) -> Result<bool, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let updated = BookingRepo::update_status_guarded(
            &mut tx,
            id,
            expected.as_str(),
            new_status.as_str(),
            booking_stage_column(new_status),
        )
        .await
        .map_err(db_err)?;
        if !updated {
            // Nothing written; the guard lost. Roll back the empty tx.
            tx.rollback().await.map_err(db_err)?;
            return Ok(false);
        }
        StatusHistoryRepo::append(
            &mut tx,
            EntityKind::Booking.as_str(),
            id,
            new_status.as_str(),
            actor_id,
            notes,
        )
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(true)
    }

    async fn transition_job(
        &self,
        id: DbId,
        expected: JobStatus,
        new_status: JobStatus,
        actor_id: DbId,
        notes: Option<&str>,
    ) -> Result<bool, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let updated = JobRepo::update_status_guarded(
            &mut tx,
            id,
            expected.as_str(),
            new_status.as_str(),
            new_status == JobStatus::Completed,
        )
        .await
        .map_err(db_err)?;
        if !updated {
            tx.rollback().await.map_err(db_err)?;
            return Ok(false);
        }
        StatusHistoryRepo::append(
            &mut tx,
            EntityKind::Job.as_str(),
            id,
            new_status.as_str(),
            actor_id,
            notes,
        )
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(true)
    }

    async fn list_status_history(
        &self,
        kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<StatusHistoryEntry>, CoreError> {
        StatusHistoryRepo::list_for_entity(&self.pool, kind.as_str(), entity_id)
            .await
            .map_err(db_err)
    }

    async fn add_line_item(
        &self,
        job_id: DbId,
        category: &str,
        quantity: i32,
    ) -> Result<JobLineItem, CoreError> {
        JobRepo::add_line_item(&self.pool, job_id, category, quantity)
            .await
            .map_err(db_err)
    }

    async fn list_line_items(&self, job_id: DbId) -> Result<Vec<JobLineItem>, CoreError> {
        JobRepo::list_line_items(&self.pool, job_id)
            .await
            .map_err(db_err)
    }

    async fn find_line_item(&self, line_id: DbId) -> Result<Option<JobLineItem>, CoreError> {
        JobRepo::find_line_item(&self.pool, line_id)
            .await
            .map_err(db_err)
    }

    async fn mark_line_sanitised(
        &self,
        line_id: DbId,
        wipe_method: &str,
    ) -> Result<bool, CoreError> {
        JobRepo::mark_line_sanitised(&self.pool, line_id, wipe_method)
            .await
            .map_err(db_err)
    }

    async fn set_line_grade(
        &self,
        line_id: DbId,
        grade: &str,
        resale_value_pence: i64,
    ) -> Result<bool, CoreError> {
        JobRepo::set_line_grade(&self.pool, line_id, grade, resale_value_pence)
            .await
            .map_err(db_err)
    }

    async fn unsanitised_count(&self, job_id: DbId) -> Result<i64, CoreError> {
        JobRepo::unsanitised_count(&self.pool, job_id)
            .await
            .map_err(db_err)
    }

    async fn ungraded_count(&self, job_id: DbId) -> Result<i64, CoreError> {
        JobRepo::ungraded_count(&self.pool, job_id)
            .await
            .map_err(db_err)
    }

    async fn insert_evidence(
        &self,
        job_id: DbId,
        status: JobStatus,
        evidence: &NewEvidence,
        submitted_by: DbId,
    ) -> Result<EvidenceRecord, CoreError> {
        EvidenceRepo::insert(
            &self.pool,
            job_id,
            status.as_str(),
            &evidence.photo_keys,
            evidence.signature_key.as_deref(),
            &evidence.seal_numbers,
            evidence.notes.as_deref(),
            submitted_by,
        )
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(d) if d.is_unique_violation() => CoreError::DuplicateEvidence {
                job_id,
                status: status.as_str(),
            },
            _ => db_err(e),
        })
    }

    async fn list_evidence(&self, job_id: DbId) -> Result<Vec<EvidenceRecord>, CoreError> {
        EvidenceRepo::list_for_job(&self.pool, job_id)
            .await
            .map_err(db_err)
    }

    async fn find_evidence(
        &self,
        job_id: DbId,
        status: JobStatus,
    ) -> Result<Option<EvidenceRecord>, CoreError> {
        EvidenceRepo::find_for_status(&self.pool, job_id, status.as_str())
            .await
            .map_err(db_err)
    }

    async fn insert_notification_once(
        &self,
        n: &NewNotification,
    ) -> Result<Option<DbId>, CoreError> {
        NotificationRepo::insert_once(
            &self.pool,
            n.entity_kind.as_str(),
            n.entity_id,
            n.milestone.as_str(),
            n.role.as_str(),
            n.recipient_id,
            &n.title,
            &n.message,
            &n.link,
        )
        .await
        .map_err(db_err)
    }

    async fn list_notifications(
        &self,
        kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<NotificationRecord>, CoreError> {
        NotificationRepo::list_for_entity(&self.pool, kind.as_str(), entity_id)
            .await
            .map_err(db_err)
    }

    async fn find_document(
        &self,
        job_id: DbId,
        doc_type: &str,
    ) -> Result<Option<CustodyDocument>, CoreError> {
        DocumentRepo::find_for_job(&self.pool, job_id, doc_type)
            .await
            .map_err(db_err)
    }

    async fn insert_document_once(
        &self,
        job_id: DbId,
        doc_type: &str,
        storage_key: &str,
        size_bytes: i64,
        generated_by: DbId,
    ) -> Result<Option<CustodyDocument>, CoreError> {
        DocumentRepo::insert_once(
            &self.pool,
            job_id,
            doc_type,
            storage_key,
            size_bytes,
            generated_by,
        )
        .await
        .map_err(db_err)
    }
}
