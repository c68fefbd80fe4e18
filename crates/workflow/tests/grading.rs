//! Sanitisation and grading of line items in the warehouse.

mod common;

use assert_matches::assert_matches;
use common::*;

use reloop_core::CoreError;
use reloop_db::models::{Job, JobLineItem};

async fn warehouse_job_with_lines(h: &Harness) -> (Job, Vec<JobLineItem>) {
    let (_, job) = job_at_warehouse(h).await;
    let laptops = h.orchestrator.add_line_item(job.id, "laptop", 3).await.unwrap();
    let servers = h.orchestrator.add_line_item(job.id, "server", 1).await.unwrap();
    (job, vec![laptops, servers])
}

#[tokio::test]
async fn sanitising_every_line_advances_the_job() {
    let h = harness();
    let (job, lines) = warehouse_job_with_lines(&h).await;

    let first = h
        .orchestrator
        .sanitise_line(lines[0].id, "software_wipe", ACTOR)
        .await
        .unwrap();
    assert!(first.sanitised);
    assert_eq!(first.wipe_method.as_deref(), Some("software_wipe"));
    assert!(first.sanitised_at.is_some());
    // One line still outstanding.
    let job_mid = h.store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job_mid.status, "warehouse");

    h.orchestrator
        .sanitise_line(lines[1].id, "shred", ACTOR)
        .await
        .unwrap();
    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, "sanitised");
}

#[tokio::test]
async fn a_line_cannot_be_sanitised_twice() {
    let h = harness();
    let (_, lines) = warehouse_job_with_lines(&h).await;
    h.orchestrator
        .sanitise_line(lines[0].id, "software_wipe", ACTOR)
        .await
        .unwrap();

    let err = h
        .orchestrator
        .sanitise_line(lines[0].id, "degauss", ACTOR)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::AlreadySanitised { .. });

    // The original record stands untouched.
    let line = h.store.find_line_item(lines[0].id).await.unwrap().unwrap();
    assert_eq!(line.wipe_method.as_deref(), Some("software_wipe"));
}

#[tokio::test]
async fn unknown_wipe_methods_are_rejected() {
    let h = harness();
    let (_, lines) = warehouse_job_with_lines(&h).await;

    let err = h
        .orchestrator
        .sanitise_line(lines[0].id, "format_c", ACTOR)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[tokio::test]
async fn grading_every_line_values_and_advances_the_job() {
    let h = harness();
    let (job, lines) = warehouse_job_with_lines(&h).await;
    for line in &lines {
        h.orchestrator
            .sanitise_line(line.id, "software_wipe", ACTOR)
            .await
            .unwrap();
    }

    // Three grade-a laptops at the flat per-unit rate.
    let laptops = h.orchestrator.grade_line(lines[0].id, "a", ACTOR).await.unwrap();
    assert_eq!(laptops.grade.as_deref(), Some("a"));
    assert_eq!(laptops.resale_value_pence, Some(36_000));

    let servers = h.orchestrator.grade_line(lines[1].id, "scrap", ACTOR).await.unwrap();
    assert_eq!(servers.resale_value_pence, Some(0));

    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, "graded");
}

#[tokio::test]
async fn a_line_cannot_be_graded_twice() {
    let h = harness();
    let (_, lines) = warehouse_job_with_lines(&h).await;
    h.orchestrator.grade_line(lines[0].id, "b", ACTOR).await.unwrap();

    let err = h
        .orchestrator
        .grade_line(lines[0].id, "a", ACTOR)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::AlreadyGraded { .. });

    let line = h.store.find_line_item(lines[0].id).await.unwrap().unwrap();
    assert_eq!(line.grade.as_deref(), Some("b"));
}

#[tokio::test]
async fn grading_out_of_order_does_not_advance_the_job() {
    let h = harness();
    let (job, lines) = warehouse_job_with_lines(&h).await;

    // All lines graded while the job is still at warehouse intake; the
    // grade records stand but the job waits for sanitisation.
    for line in &lines {
        h.orchestrator.grade_line(line.id, "c", ACTOR).await.unwrap();
    }
    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, "warehouse");
}

#[tokio::test]
async fn line_items_require_a_known_job_and_positive_quantity() {
    let h = harness();
    let (job, _) = warehouse_job_with_lines(&h).await;

    let err = h
        .orchestrator
        .add_line_item(999, "laptop", 1)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "job", id: 999 });

    let err = h.orchestrator.add_line_item(job.id, "laptop", 0).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));

    let err = h.orchestrator.add_line_item(job.id, "   ", 1).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}
