//! In-memory [`WorkflowStore`] for tests and demos.
//!
//! A single mutex over all tables keeps every guarded write atomic
//! without row locking. Unique keys are enforced the same way the
//! Postgres schema enforces them: evidence on `(job, status)`,
//! documents on `(job, doc_type)`, notifications on their five-column
//! logical key.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use reloop_core::evidence::NewEvidence;
use reloop_core::status::{BookingStatus, JobStatus};
use reloop_core::types::{DbId, EntityKind};
use reloop_core::CoreError;
use reloop_db::models::{
    Booking, CustodyDocument, EvidenceRecord, Job, JobLineItem, NotificationRecord,
    StatusHistoryEntry,
};

use super::{booking_stage_column, NewNotification, WorkflowStore};

#[derive(Default)]
struct Inner {
    next_id: DbId,
    bookings: HashMap<DbId, Booking>,
    jobs: HashMap<DbId, Job>,
    line_items: HashMap<DbId, JobLineItem>,
    evidence: HashMap<(DbId, String), EvidenceRecord>,
    history: Vec<StatusHistoryEntry>,
    notifications: Vec<NotificationRecord>,
    notification_keys: HashSet<(String, DbId, String, String, DbId)>,
    documents: HashMap<(DbId, String), CustodyDocument>,
}

impl Inner {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Mutex-backed [`WorkflowStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Poisoning only happens if a holder panicked; tests want the
        // state anyway.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn find_booking(&self, id: DbId) -> Result<Option<Booking>, CoreError> {
        Ok(self.lock().bookings.get(&id).cloned())
    }

    async fn find_job(&self, id: DbId) -> Result<Option<Job>, CoreError> {
        Ok(self.lock().jobs.get(&id).cloned())
    }

    async fn find_job_by_booking(&self, booking_id: DbId) -> Result<Option<Job>, CoreError> {
        Ok(self
            .lock()
            .jobs
            .values()
            .find(|j| j.booking_id == booking_id)
            .cloned())
    }

    async fn create_booking(
        &self,
        booking_number: &str,
        client_id: DbId,
        scheduled_date: Option<chrono::NaiveDate>,
    ) -> Result<Booking, CoreError> {
        let mut inner = self.lock();
        let now = Utc::now();
        let booking = Booking {
            id: inner.next_id(),
            booking_number: booking_number.to_string(),
            status: BookingStatus::Pending.as_str().to_string(),
            scheduled_date,
            client_id,
            driver_id: None,
            job_id: None,
            scheduled_at: None,
            collected_at: None,
            sanitised_at: None,
            graded_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn create_job_for_booking(
        &self,
        job_reference: &str,
        booking_id: DbId,
        driver_id: Option<DbId>,
    ) -> Result<Job, CoreError> {
        let mut inner = self.lock();
        if let Some(existing) = inner.jobs.values().find(|j| j.booking_id == booking_id) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let job = Job {
            id: inner.next_id(),
            job_reference: job_reference.to_string(),
            status: JobStatus::Booked.as_str().to_string(),
            booking_id,
            driver_id,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn link_booking_job(&self, booking_id: DbId, job_id: DbId) -> Result<(), CoreError> {
        let mut inner = self.lock();
        if let Some(booking) = inner.bookings.get_mut(&booking_id) {
            if booking.job_id.is_none() {
                booking.job_id = Some(job_id);
                booking.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn set_booking_driver(
        &self,
        booking_id: DbId,
        driver_id: DbId,
    ) -> Result<(), CoreError> {
        let mut inner = self.lock();
        if let Some(booking) = inner.bookings.get_mut(&booking_id) {
            booking.driver_id = Some(driver_id);
            booking.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_job_driver(&self, job_id: DbId, driver_id: DbId) -> Result<(), CoreError> {
        let mut inner = self.lock();
        if let Some(job) = inner.jobs.get_mut(&job_id) {
            job.driver_id = Some(driver_id);
            job.updated_at = Utc::now();
        }
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
        let mut inner = self.lock();
        let now = Utc::now();
        let Some(booking) = inner.bookings.get_mut(&id) else {
            return Ok(false);
        };
        if booking.status != expected.as_str() {
            return Ok(false);
        }
        booking.status = new_status.as_str().to_string();
        booking.updated_at = now;
        if let Some(column) = booking_stage_column(new_status) {
            let slot = match column {
                "scheduled_at" => &mut booking.scheduled_at,
                "collected_at" => &mut booking.collected_at,
                "sanitised_at" => &mut booking.sanitised_at,
                "graded_at" => &mut booking.graded_at,
                _ => &mut booking.completed_at,
            };
            slot.get_or_insert(now);
        }
        let entry = StatusHistoryEntry {
            id: inner.next_id(),
            entity_type: EntityKind::Booking.as_str().to_string(),
            entity_id: id,
            status: new_status.as_str().to_string(),
            actor_id,
            notes: notes.map(str::to_string),
            created_at: now,
        };
        inner.history.push(entry);
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
        let mut inner = self.lock();
        let now = Utc::now();
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status != expected.as_str() {
            return Ok(false);
        }
        job.status = new_status.as_str().to_string();
        job.updated_at = now;
        if new_status == JobStatus::Completed {
            job.completed_at.get_or_insert(now);
        }
        let entry = StatusHistoryEntry {
            id: inner.next_id(),
            entity_type: EntityKind::Job.as_str().to_string(),
            entity_id: id,
            status: new_status.as_str().to_string(),
            actor_id,
            notes: notes.map(str::to_string),
            created_at: now,
        };
        inner.history.push(entry);
        Ok(true)
    }

    async fn list_status_history(
        &self,
        kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<StatusHistoryEntry>, CoreError> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|h| h.entity_type == kind.as_str() && h.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn add_line_item(
        &self,
        job_id: DbId,
        category: &str,
        quantity: i32,
    ) -> Result<JobLineItem, CoreError> {
        let mut inner = self.lock();
        let now = Utc::now();
        let line = JobLineItem {
            id: inner.next_id(),
            job_id,
            category: category.to_string(),
            quantity,
            sanitised: false,
            wipe_method: None,
            sanitised_at: None,
            grade: None,
            graded_at: None,
            resale_value_pence: None,
            created_at: now,
            updated_at: now,
        };
        inner.line_items.insert(line.id, line.clone());
        Ok(line)
    }

    async fn list_line_items(&self, job_id: DbId) -> Result<Vec<JobLineItem>, CoreError> {
        let mut items: Vec<JobLineItem> = self
            .lock()
            .line_items
            .values()
            .filter(|l| l.job_id == job_id)
            .cloned()
            .collect();
        items.sort_by_key(|l| l.id);
        Ok(items)
    }

    async fn find_line_item(&self, line_id: DbId) -> Result<Option<JobLineItem>, CoreError> {
        Ok(self.lock().line_items.get(&line_id).cloned())
    }

    async fn mark_line_sanitised(
        &self,
        line_id: DbId,
        wipe_method: &str,
    ) -> Result<bool, CoreError> {
        let mut inner = self.lock();
        let Some(line) = inner.line_items.get_mut(&line_id) else {
            return Ok(false);
        };
        if line.sanitised {
            return Ok(false);
        }
        let now = Utc::now();
        line.sanitised = true;
        line.wipe_method = Some(wipe_method.to_string());
        line.sanitised_at = Some(now);
        line.updated_at = now;
        Ok(true)
    }

    async fn set_line_grade(
        &self,
        line_id: DbId,
        grade: &str,
        resale_value_pence: i64,
    ) -> Result<bool, CoreError> {
        let mut inner = self.lock();
        let Some(line) = inner.line_items.get_mut(&line_id) else {
            return Ok(false);
        };
        if line.grade.is_some() {
            return Ok(false);
        }
        let now = Utc::now();
        line.grade = Some(grade.to_string());
        line.resale_value_pence = Some(resale_value_pence);
        line.graded_at = Some(now);
        line.updated_at = now;
        Ok(true)
    }

    async fn unsanitised_count(&self, job_id: DbId) -> Result<i64, CoreError> {
        Ok(self
            .lock()
            .line_items
            .values()
            .filter(|l| l.job_id == job_id && !l.sanitised)
            .count() as i64)
    }

    async fn ungraded_count(&self, job_id: DbId) -> Result<i64, CoreError> {
        Ok(self
            .lock()
            .line_items
            .values()
            .filter(|l| l.job_id == job_id && l.grade.is_none())
            .count() as i64)
    }

    async fn insert_evidence(
        &self,
        job_id: DbId,
        status: JobStatus,
        evidence: &NewEvidence,
        submitted_by: DbId,
    ) -> Result<EvidenceRecord, CoreError> {
        let mut inner = self.lock();
        let key = (job_id, status.as_str().to_string());
        if inner.evidence.contains_key(&key) {
            return Err(CoreError::DuplicateEvidence {
                job_id,
                status: status.as_str(),
            });
        }
        let record = EvidenceRecord {
            id: inner.next_id(),
            job_id,
            status: status.as_str().to_string(),
            photo_keys: evidence.photo_keys.clone(),
            signature_key: evidence.signature_key.clone(),
            seal_numbers: evidence.seal_numbers.clone(),
            notes: evidence.notes.clone(),
            submitted_by,
            created_at: Utc::now(),
        };
        inner.evidence.insert(key, record.clone());
        Ok(record)
    }

    async fn list_evidence(&self, job_id: DbId) -> Result<Vec<EvidenceRecord>, CoreError> {
        let mut records: Vec<EvidenceRecord> = self
            .lock()
            .evidence
            .values()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect();
        records.sort_by_key(|e| e.id);
        Ok(records)
    }

    async fn find_evidence(
        &self,
        job_id: DbId,
        status: JobStatus,
    ) -> Result<Option<EvidenceRecord>, CoreError> {
        Ok(self
            .lock()
            .evidence
            .get(&(job_id, status.as_str().to_string()))
            .cloned())
    }

    async fn insert_notification_once(
        &self,
        n: &NewNotification,
    ) -> Result<Option<DbId>, CoreError> {
        let mut inner = self.lock();
        let key = (
            n.entity_kind.as_str().to_string(),
            n.entity_id,
            n.milestone.as_str().to_string(),
            n.role.as_str().to_string(),
            n.recipient_id,
        );
        if !inner.notification_keys.insert(key) {
            return Ok(None);
        }
        let record = NotificationRecord {
            id: inner.next_id(),
            entity_type: n.entity_kind.as_str().to_string(),
            entity_id: n.entity_id,
            milestone: n.milestone.as_str().to_string(),
            role: n.role.as_str().to_string(),
            recipient_id: n.recipient_id,
            title: n.title.clone(),
            message: n.message.clone(),
            link: n.link.clone(),
            created_at: Utc::now(),
        };
        let id = record.id;
        inner.notifications.push(record);
        Ok(Some(id))
    }

    async fn list_notifications(
        &self,
        kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<NotificationRecord>, CoreError> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.entity_type == kind.as_str() && n.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn find_document(
        &self,
        job_id: DbId,
        doc_type: &str,
    ) -> Result<Option<CustodyDocument>, CoreError> {
        Ok(self
            .lock()
            .documents
            .get(&(job_id, doc_type.to_string()))
            .cloned())
    }

    async fn insert_document_once(
        &self,
        job_id: DbId,
        doc_type: &str,
        storage_key: &str,
        size_bytes: i64,
        generated_by: DbId,
    ) -> Result<Option<CustodyDocument>, CoreError> {
        let mut inner = self.lock();
        let key = (job_id, doc_type.to_string());
        if inner.documents.contains_key(&key) {
            return Ok(None);
        }
        let document = CustodyDocument {
            id: inner.next_id(),
            job_id,
            doc_type: doc_type.to_string(),
            storage_key: storage_key.to_string(),
            size_bytes,
            generated_by,
            created_at: Utc::now(),
        };
        inner.documents.insert(key, document.clone());
        Ok(Some(document))
    }
}
