//! End-to-end status flow through the coupled Booking/Job pair.

mod common;

use assert_matches::assert_matches;
use common::*;

use reloop_core::status::{BookingStatus, JobStatus};
use reloop_core::types::EntityKind;
use reloop_core::CoreError;
use reloop_workflow::StatusTarget;

#[tokio::test]
async fn approval_does_not_open_a_job() {
    let h = harness();
    let booking = h
        .orchestrator
        .create_booking(CLIENT, None, ACTOR)
        .await
        .unwrap();
    assert_eq!(booking.status, "pending");

    let booking = h.orchestrator.approve_booking(booking.id, ACTOR).await.unwrap();
    assert_eq!(booking.status, "created");
    // Jobs open on driver assignment, not approval.
    assert!(h
        .store
        .find_job_by_booking(booking.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn rejected_driver_assignment_leaves_no_partial_state() {
    let h = harness();
    let booking = h
        .orchestrator
        .create_booking(CLIENT, None, ACTOR)
        .await
        .unwrap();

    // Still pending, so assignment must be refused outright.
    let err = h
        .orchestrator
        .assign_driver(booking.id, DRIVER, ACTOR)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::InvalidTransition {
            current: "pending",
            requested: "scheduled",
            ..
        }
    );

    // The refusal opened no job and wrote no driver link.
    assert!(h
        .store
        .find_job_by_booking(booking.id)
        .await
        .unwrap()
        .is_none());
    let booking = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, "pending");
    assert!(booking.driver_id.is_none());
}

#[tokio::test]
async fn scheduling_without_a_driver_creates_no_job() {
    let h = harness();
    let booking = h
        .orchestrator
        .create_booking(CLIENT, None, ACTOR)
        .await
        .unwrap();
    h.orchestrator.approve_booking(booking.id, ACTOR).await.unwrap();

    let updated = h
        .orchestrator
        .apply_status_change(
            booking.id,
            StatusTarget::Booking(BookingStatus::Scheduled),
            ACTOR,
            None,
        )
        .await
        .unwrap();
    let booking = match updated {
        reloop_workflow::UpdatedEntity::Booking(b) => b,
        other => panic!("expected a booking, got {other:?}"),
    };
    assert_eq!(booking.status, "scheduled");
    assert!(booking.scheduled_at.is_some());
    assert!(h
        .store
        .find_job_by_booking(booking.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn driver_assignment_opens_exactly_one_job() {
    let h = harness();
    let (booking, job) = scheduled_booking(&h).await;
    assert_eq!(booking.job_id, Some(job.id));
    assert_eq!(job.booking_id, booking.id);
    assert_eq!(job.status, "routed");
}

#[tokio::test]
async fn assigning_a_driver_schedules_the_booking_and_routes_the_job() {
    let h = harness();
    let (booking, job) = scheduled_booking(&h).await;

    assert_eq!(booking.status, "scheduled");
    assert!(booking.scheduled_at.is_some());
    assert_eq!(booking.driver_id, Some(DRIVER));
    assert_eq!(job.status, "routed");
    assert_eq!(job.driver_id, Some(DRIVER));
}

#[tokio::test]
async fn collection_echoes_onto_the_booking_once() {
    let h = harness();
    let (booking, job) = job_at_warehouse(&h).await;

    assert_eq!(job.status, "warehouse");
    // Collected when the driver picked up; the warehouse intake maps to
    // the same booking status and must not write it twice.
    assert_eq!(booking.status, "collected");
    assert!(booking.collected_at.is_some());

    let history = h
        .store
        .list_status_history(EntityKind::Booking, booking.id)
        .await
        .unwrap();
    let collected_entries = history.iter().filter(|e| e.status == "collected").count();
    assert_eq!(collected_entries, 1);
}

#[tokio::test]
async fn full_lifecycle_reaches_completed_on_both_sides() {
    let h = harness();
    let (booking, job) = job_at_warehouse(&h).await;
    let line = h
        .orchestrator
        .add_line_item(job.id, "laptop", 2)
        .await
        .unwrap();

    h.orchestrator
        .sanitise_line(line.id, "software_wipe", ACTOR)
        .await
        .unwrap();
    h.orchestrator.grade_line(line.id, "b", ACTOR).await.unwrap();
    let job = h.orchestrator.complete_job(job.id, ACTOR).await.unwrap();

    assert_eq!(job.status, "completed");
    assert!(job.completed_at.is_some());
    let booking = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, "completed");
    assert!(booking.completed_at.is_some());
    assert!(booking.sanitised_at.is_some());
    assert!(booking.graded_at.is_some());
}

#[tokio::test]
async fn transitions_cannot_skip_steps() {
    let h = harness();
    let (_, job) = scheduled_booking(&h).await;

    let err = h
        .orchestrator
        .apply_status_change(job.id, StatusTarget::Job(JobStatus::Arrived), ACTOR, None)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::InvalidTransition {
            entity: "job",
            current: "routed",
            requested: "arrived",
        }
    );
}

#[tokio::test]
async fn approving_twice_is_an_invalid_transition() {
    let h = harness();
    let booking = h
        .orchestrator
        .create_booking(CLIENT, None, ACTOR)
        .await
        .unwrap();
    h.orchestrator.approve_booking(booking.id, ACTOR).await.unwrap();

    let err = h
        .orchestrator
        .approve_booking(booking.id, ACTOR)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::InvalidTransition { current: "created", .. });
}

#[tokio::test]
async fn cancelling_a_booking_cancels_its_job() {
    let h = harness();
    let (booking, job) = scheduled_booking(&h).await;

    h.orchestrator
        .cancel(EntityKind::Booking, booking.id, ACTOR, Some("client call"))
        .await
        .unwrap();

    let booking = h.store.find_booking(booking.id).await.unwrap().unwrap();
    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(booking.status, "cancelled");
    assert_eq!(job.status, "cancelled");
}

#[tokio::test]
async fn terminal_entities_reject_further_changes() {
    let h = harness();
    let (_, job) = scheduled_booking(&h).await;
    h.orchestrator
        .cancel(EntityKind::Job, job.id, ACTOR, None)
        .await
        .unwrap();

    let err = h
        .orchestrator
        .apply_status_change(job.id, StatusTarget::Job(JobStatus::EnRoute), ACTOR, None)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::InvalidTransition { current: "cancelled", .. });
}

#[tokio::test]
async fn status_history_records_every_hop_with_actor() {
    let h = harness();
    let (_, job) = job_at_warehouse(&h).await;

    let history = h
        .store
        .list_status_history(EntityKind::Job, job.id)
        .await
        .unwrap();
    let statuses: Vec<&str> = history.iter().map(|e| e.status.as_str()).collect();
    assert_eq!(
        statuses,
        ["routed", "en_route", "arrived", "collected", "warehouse"]
    );
    // Collection evidence was submitted by the driver.
    let collected = history.iter().find(|e| e.status == "collected").unwrap();
    assert_eq!(collected.actor_id, DRIVER);
}

#[tokio::test]
async fn missing_entities_surface_not_found() {
    let h = harness();
    let err = h
        .orchestrator
        .apply_status_change(999, StatusTarget::Booking(BookingStatus::Created), ACTOR, None)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "booking", id: 999 });
}
