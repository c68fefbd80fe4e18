//! The workflow orchestrator.
//!
//! Single write path for Booking and Job status. Every change is
//! validated against the transition tables, committed through the
//! store's optimistic guard, then followed by post-commit side effects
//! (bus event, notifications, custody document) and a one-hop echo that
//! keeps the paired entity consistent via the status mappers. Echo
//! writes never cascade further, so a Booking change can touch its Job
//! and vice versa, but nothing loops.

use std::sync::Arc;

use uuid::Uuid;

use reloop_core::evidence::NewEvidence;
use reloop_core::line_item::{validate_grade, validate_quantity, validate_wipe_method};
use reloop_core::milestone::{special_job_milestone, Milestone};
use reloop_core::status::{BookingStatus, JobStatus};
use reloop_core::status_map::{map_booking_status_to_job, map_job_status_to_booking};
use reloop_core::types::{DbId, EntityKind};
use reloop_core::CoreError;
use reloop_db::models::{Booking, EvidenceRecord, Job, JobLineItem};
use reloop_events::bus::{EventBus, WorkflowEvent};

use crate::documents::DocumentService;
use crate::notifications::NotificationDispatcher;
use crate::store::WorkflowStore;
use crate::valuation::ValuationCalculator;

/// A requested status change, typed per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTarget {
    Booking(BookingStatus),
    Job(JobStatus),
}

/// The entity a status change landed on.
#[derive(Debug, Clone)]
pub enum UpdatedEntity {
    Booking(Booking),
    Job(Job),
}

/// Coordinates status changes and their side effects.
pub struct Orchestrator {
    store: Arc<dyn WorkflowStore>,
    bus: Arc<EventBus>,
    dispatcher: Arc<NotificationDispatcher>,
    documents: Arc<DocumentService>,
    valuer: Arc<dyn ValuationCalculator>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        bus: Arc<EventBus>,
        dispatcher: Arc<NotificationDispatcher>,
        documents: Arc<DocumentService>,
        valuer: Arc<dyn ValuationCalculator>,
    ) -> Self {
        Self {
            store,
            bus,
            dispatcher,
            documents,
            valuer,
        }
    }

    // -----------------------------------------------------------------------
    // Status changes
    // -----------------------------------------------------------------------

    /// Apply an externally requested status change.
    ///
    /// Validates against the transition table for the entity, commits
    /// under the optimistic guard, runs side effects, and echoes the
    /// mapped status onto the paired entity where the mapper yields one.
    pub async fn apply_status_change(
        &self,
        entity_id: DbId,
        target: StatusTarget,
        actor_id: DbId,
        notes: Option<&str>,
    ) -> Result<UpdatedEntity, CoreError> {
        match target {
            StatusTarget::Booking(status) => self
                .apply_booking(entity_id, status, actor_id, None, notes)
                .await
                .map(UpdatedEntity::Booking),
            StatusTarget::Job(status) => self
                .apply_job(entity_id, status, actor_id, None, notes)
                .await
                .map(UpdatedEntity::Job),
        }
    }

    async fn apply_booking(
        &self,
        booking_id: DbId,
        new_status: BookingStatus,
        actor_id: DbId,
        milestone_override: Option<Milestone>,
        notes: Option<&str>,
    ) -> Result<Booking, CoreError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "booking",
                id: booking_id,
            })?;
        let current = booking.status()?;
        if !current.is_valid_transition(new_status) {
            return Err(CoreError::InvalidTransition {
                entity: "booking",
                current: current.as_str(),
                requested: new_status.as_str(),
            });
        }
        if !self
            .store
            .transition_booking(booking_id, current, new_status, actor_id, notes)
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "booking {booking_id} changed concurrently while moving to '{new_status}'"
            )));
        }
        let booking = self.reload_booking(booking_id).await?;
        let job = self.store.find_job_by_booking(booking_id).await?;

        let milestone = milestone_override.unwrap_or(Milestone::StatusChanged);
        let event = WorkflowEvent::new(
            milestone,
            EntityKind::Booking,
            booking_id,
            Some(current.as_str()),
            new_status.as_str(),
            actor_id,
        );
        tracing::info!(
            booking_id,
            from = current.as_str(),
            to = new_status.as_str(),
            milestone = %milestone,
            "Booking status changed"
        );
        self.bus.publish(event.clone());
        self.dispatcher
            .dispatch(&event, Some(&booking), job.as_ref())
            .await;

        if let Some(job) = job {
            let job_status = job.status()?;
            if let Some(target) = map_booking_status_to_job(new_status, job_status) {
                self.echo_job(&job, target, actor_id).await?;
            }
        }
        Ok(booking)
    }

    async fn apply_job(
        &self,
        job_id: DbId,
        new_status: JobStatus,
        actor_id: DbId,
        milestone_override: Option<Milestone>,
        notes: Option<&str>,
    ) -> Result<Job, CoreError> {
        let job = self.store.find_job(job_id).await?.ok_or(CoreError::NotFound {
            entity: "job",
            id: job_id,
        })?;
        let current = job.status()?;
        if !current.is_valid_transition(new_status) {
            return Err(CoreError::InvalidTransition {
                entity: "job",
                current: current.as_str(),
                requested: new_status.as_str(),
            });
        }
        if !self
            .store
            .transition_job(job_id, current, new_status, actor_id, notes)
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "job {job_id} changed concurrently while moving to '{new_status}'"
            )));
        }
        let job = self.reload_job(job_id).await?;
        let booking = self.store.find_booking(job.booking_id).await?;

        let milestone = milestone_override
            .or_else(|| special_job_milestone(new_status))
            .unwrap_or(Milestone::StatusChanged);
        let event = WorkflowEvent::new(
            milestone,
            EntityKind::Job,
            job_id,
            Some(current.as_str()),
            new_status.as_str(),
            actor_id,
        );
        tracing::info!(
            job_id,
            from = current.as_str(),
            to = new_status.as_str(),
            milestone = %milestone,
            "Job status changed"
        );
        self.bus.publish(event.clone());
        self.dispatcher
            .dispatch(&event, booking.as_ref(), Some(&job))
            .await;

        if new_status == JobStatus::Warehouse {
            // Generation failures must not unwind a committed intake; the
            // next warehouse-side trigger retries.
            if let Err(err) = self.documents.on_reached_intake(job_id, actor_id).await {
                tracing::warn!(job_id, error = %err, "Custody document generation failed");
            }
        }

        if let Some(booking) = booking {
            if let Some(target) = map_job_status_to_booking(new_status) {
                self.echo_booking(&booking, target, actor_id).await?;
            }
        }
        Ok(job)
    }

    /// One-hop echo onto the Job after a Booking change. Does not
    /// cascade back.
    async fn echo_job(
        &self,
        job: &Job,
        target: JobStatus,
        actor_id: DbId,
    ) -> Result<(), CoreError> {
        let current = job.status()?;
        // The paired entity having already reached (or passed) the
        // mapped status is the expected steady state, not an error.
        if current.is_at_or_past(target) {
            return Ok(());
        }
        if !current.is_valid_transition(target) {
            tracing::warn!(
                job_id = job.id,
                current = current.as_str(),
                target = target.as_str(),
                "Skipping job echo, transition not allowed from current status"
            );
            return Ok(());
        }
        if !self
            .store
            .transition_job(job.id, current, target, actor_id, Some(SYNC_NOTE))
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "job {} changed concurrently during echo to '{target}'",
                job.id
            )));
        }
        let job = self.reload_job(job.id).await?;
        let booking = self.store.find_booking(job.booking_id).await?;
        let milestone = special_job_milestone(target).unwrap_or(Milestone::StatusChanged);
        let event = WorkflowEvent::new(
            milestone,
            EntityKind::Job,
            job.id,
            Some(current.as_str()),
            target.as_str(),
            actor_id,
        );
        tracing::info!(job_id = job.id, to = target.as_str(), "Job echoed to mapped status");
        self.bus.publish(event.clone());
        self.dispatcher
            .dispatch(&event, booking.as_ref(), Some(&job))
            .await;
        Ok(())
    }

    /// One-hop echo onto the Booking after a Job change. Does not
    /// cascade back.
    async fn echo_booking(
        &self,
        booking: &Booking,
        target: BookingStatus,
        actor_id: DbId,
    ) -> Result<(), CoreError> {
        let current = booking.status()?;
        if current.is_at_or_past(target) {
            return Ok(());
        }
        if !current.is_valid_transition(target) {
            tracing::warn!(
                booking_id = booking.id,
                current = current.as_str(),
                target = target.as_str(),
                "Skipping booking echo, transition not allowed from current status"
            );
            return Ok(());
        }
        if !self
            .store
            .transition_booking(booking.id, current, target, actor_id, Some(SYNC_NOTE))
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "booking {} changed concurrently during echo to '{target}'",
                booking.id
            )));
        }
        let booking = self.reload_booking(booking.id).await?;
        let job = self.store.find_job_by_booking(booking.id).await?;
        let event = WorkflowEvent::new(
            Milestone::StatusChanged,
            EntityKind::Booking,
            booking.id,
            Some(current.as_str()),
            target.as_str(),
            actor_id,
        );
        tracing::info!(
            booking_id = booking.id,
            to = target.as_str(),
            "Booking echoed to mapped status"
        );
        self.bus.publish(event.clone());
        self.dispatcher
            .dispatch(&event, Some(&booking), job.as_ref())
            .await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Booking lifecycle
    // -----------------------------------------------------------------------

    /// Register a new collection booking in `pending` status.
    pub async fn create_booking(
        &self,
        client_id: DbId,
        scheduled_date: Option<chrono::NaiveDate>,
        actor_id: DbId,
    ) -> Result<Booking, CoreError> {
        let booking = self
            .store
            .create_booking(&new_reference("BK"), client_id, scheduled_date)
            .await?;
        tracing::info!(
            booking_id = booking.id,
            booking_number = %booking.booking_number,
            client_id,
            "Booking created"
        );
        let event = WorkflowEvent::new(
            Milestone::StatusChanged,
            EntityKind::Booking,
            booking.id,
            None,
            booking.status.as_str(),
            actor_id,
        );
        self.bus.publish(event.clone());
        self.dispatcher.dispatch(&event, Some(&booking), None).await;
        Ok(booking)
    }

    /// Approve a pending booking.
    ///
    /// The collection job is not opened here; that happens when a driver
    /// is assigned.
    pub async fn approve_booking(
        &self,
        booking_id: DbId,
        actor_id: DbId,
    ) -> Result<Booking, CoreError> {
        self.apply_booking(booking_id, BookingStatus::Created, actor_id, None, None)
            .await
    }

    /// Assign a driver and schedule the collection in one step.
    ///
    /// The booking moves to `scheduled` under the driver-assigned
    /// milestone; the echo routes the job to the driver.
    pub async fn assign_driver(
        &self,
        booking_id: DbId,
        driver_id: DbId,
        actor_id: DbId,
    ) -> Result<(Booking, Job), CoreError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "booking",
                id: booking_id,
            })?;
        // Reject before opening the job or touching driver links; a failed
        // assignment must leave no partial state behind.
        let current = booking.status()?;
        if !current.is_valid_transition(BookingStatus::Scheduled) {
            return Err(CoreError::InvalidTransition {
                entity: "booking",
                current: current.as_str(),
                requested: BookingStatus::Scheduled.as_str(),
            });
        }
        let job = self.ensure_job(&booking, actor_id).await?;
        self.store.set_booking_driver(booking_id, driver_id).await?;
        self.store.set_job_driver(job.id, driver_id).await?;
        let booking = self
            .apply_booking(
                booking_id,
                BookingStatus::Scheduled,
                actor_id,
                Some(Milestone::DriverAssigned),
                None,
            )
            .await?;
        let job = self.reload_job(job.id).await?;
        Ok((booking, job))
    }

    /// Cancel a booking or job from any non-terminal status.
    pub async fn cancel(
        &self,
        kind: EntityKind,
        entity_id: DbId,
        actor_id: DbId,
        reason: Option<&str>,
    ) -> Result<UpdatedEntity, CoreError> {
        let target = match kind {
            EntityKind::Booking => StatusTarget::Booking(BookingStatus::Cancelled),
            EntityKind::Job => StatusTarget::Job(JobStatus::Cancelled),
        };
        self.apply_status_change(entity_id, target, actor_id, reason)
            .await
    }

    // -----------------------------------------------------------------------
    // Job operations
    // -----------------------------------------------------------------------

    /// Add a line item to a job's manifest.
    pub async fn add_line_item(
        &self,
        job_id: DbId,
        category: &str,
        quantity: i32,
    ) -> Result<JobLineItem, CoreError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(CoreError::Validation("category must not be empty".into()));
        }
        validate_quantity(quantity)?;
        self.store
            .find_job(job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "job",
                id: job_id,
            })?;
        self.store.add_line_item(job_id, category, quantity).await
    }

    /// Record custody evidence for a job status and, where the status is
    /// the job's next step, advance the job to it.
    ///
    /// Evidence for a status the job already holds (or has passed) is
    /// recorded without a transition.
    pub async fn submit_evidence(
        &self,
        job_id: DbId,
        status: JobStatus,
        evidence: NewEvidence,
        actor_id: DbId,
    ) -> Result<(EvidenceRecord, Option<Job>), CoreError> {
        // `booked` and `cancelled` are not work stages; nothing happens at
        // them that evidence could attest.
        if matches!(status, JobStatus::Booked | JobStatus::Cancelled) {
            return Err(CoreError::Validation(format!(
                "evidence cannot attest status '{status}'"
            )));
        }
        let job = self.store.find_job(job_id).await?.ok_or(CoreError::NotFound {
            entity: "job",
            id: job_id,
        })?;
        let evidence = evidence.cleaned();
        evidence.validate()?;
        let record = self
            .store
            .insert_evidence(job_id, status, &evidence, actor_id)
            .await?;
        tracing::info!(
            job_id,
            status = status.as_str(),
            photos = record.photo_keys.len(),
            "Evidence recorded"
        );
        let updated = if job.status()?.is_valid_transition(status) {
            Some(self.apply_job(job_id, status, actor_id, None, None).await?)
        } else {
            None
        };
        Ok((record, updated))
    }

    /// Record data sanitisation of a line item.
    ///
    /// When the last line on the job is sanitised, the job advances to
    /// `sanitised`.
    pub async fn sanitise_line(
        &self,
        line_id: DbId,
        wipe_method: &str,
        actor_id: DbId,
    ) -> Result<JobLineItem, CoreError> {
        validate_wipe_method(wipe_method)?;
        let line = self
            .store
            .find_line_item(line_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "line item",
                id: line_id,
            })?;
        if !self.store.mark_line_sanitised(line_id, wipe_method).await? {
            return Err(CoreError::AlreadySanitised { line_id });
        }
        if self.store.unsanitised_count(line.job_id).await? == 0 {
            self.advance_job_if_ready(line.job_id, JobStatus::Sanitised, actor_id)
                .await?;
        }
        self.reload_line(line_id).await
    }

    /// Record the grade and resale valuation of a line item.
    ///
    /// When the last line on the job is graded, the job advances to
    /// `graded`.
    pub async fn grade_line(
        &self,
        line_id: DbId,
        grade: &str,
        actor_id: DbId,
    ) -> Result<JobLineItem, CoreError> {
        validate_grade(grade)?;
        let line = self
            .store
            .find_line_item(line_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "line item",
                id: line_id,
            })?;
        let value = self
            .valuer
            .resale_value_pence(&line.category, line.quantity, grade);
        if !self.store.set_line_grade(line_id, grade, value).await? {
            return Err(CoreError::AlreadyGraded { line_id });
        }
        if self.store.ungraded_count(line.job_id).await? == 0 {
            self.advance_job_if_ready(line.job_id, JobStatus::Graded, actor_id)
                .await?;
        }
        self.reload_line(line_id).await
    }

    /// Close out a fully graded job.
    pub async fn complete_job(&self, job_id: DbId, actor_id: DbId) -> Result<Job, CoreError> {
        self.apply_job(job_id, JobStatus::Completed, actor_id, None, None)
            .await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Find or create the booking's job and record the link.
    async fn ensure_job(&self, booking: &Booking, actor_id: DbId) -> Result<Job, CoreError> {
        if let Some(job) = self.store.find_job_by_booking(booking.id).await? {
            return Ok(job);
        }
        let job = self
            .store
            .create_job_for_booking(&new_reference("JOB"), booking.id, booking.driver_id)
            .await?;
        self.store.link_booking_job(booking.id, job.id).await?;
        tracing::info!(
            booking_id = booking.id,
            job_id = job.id,
            job_reference = %job.job_reference,
            "Collection job opened"
        );
        let event = WorkflowEvent::new(
            Milestone::StatusChanged,
            EntityKind::Job,
            job.id,
            None,
            job.status.as_str(),
            actor_id,
        );
        self.bus.publish(event.clone());
        self.dispatcher
            .dispatch(&event, Some(booking), Some(&job))
            .await;
        Ok(job)
    }

    /// Advance the job after processing if its current status allows it;
    /// an out-of-order call records the line work without moving the job.
    async fn advance_job_if_ready(
        &self,
        job_id: DbId,
        target: JobStatus,
        actor_id: DbId,
    ) -> Result<(), CoreError> {
        let job = self.store.find_job(job_id).await?.ok_or(CoreError::NotFound {
            entity: "job",
            id: job_id,
        })?;
        if job.status()?.is_valid_transition(target) {
            self.apply_job(job_id, target, actor_id, None, None).await?;
        } else {
            tracing::debug!(
                job_id,
                current = %job.status,
                target = target.as_str(),
                "All lines processed but job not ready to advance"
            );
        }
        Ok(())
    }

    async fn reload_booking(&self, id: DbId) -> Result<Booking, CoreError> {
        self.store.find_booking(id).await?.ok_or(CoreError::NotFound {
            entity: "booking",
            id,
        })
    }

    async fn reload_job(&self, id: DbId) -> Result<Job, CoreError> {
        self.store
            .find_job(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "job", id })
    }

    async fn reload_line(&self, id: DbId) -> Result<JobLineItem, CoreError> {
        self.store
            .find_line_item(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "line item",
                id,
            })
    }
}

/// Audit note attached to echoed transitions.
const SYNC_NOTE: &str = "synchronized from paired entity";

fn new_reference(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", id[..8].to_uppercase())
}
