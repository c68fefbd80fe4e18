//! Custody document generation at warehouse intake.

mod common;

use assert_matches::assert_matches;
use common::*;

use reloop_core::CoreError;
use reloop_db::models::DOC_TYPE_CUSTODY;

#[tokio::test]
async fn intake_generates_the_custody_document_once() {
    let h = harness();
    let (_, job) = job_at_warehouse(&h).await;

    let document = h
        .store
        .find_document(job.id, DOC_TYPE_CUSTODY)
        .await
        .unwrap()
        .expect("document generated on intake");
    assert_eq!(
        document.storage_key,
        format!("custody/{}.pdf", job.job_reference)
    );
    assert!(document.size_bytes > 0);
    assert_eq!(h.artifacts.objects.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn a_second_trigger_returns_the_existing_document() {
    let h = harness();
    let (_, job) = job_at_warehouse(&h).await;
    let first = h.documents.on_reached_intake(job.id, ACTOR).await.unwrap();

    let second = h.documents.on_reached_intake(job.id, ACTOR).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.storage_key, second.storage_key);
    // No second artifact was written.
    assert_eq!(h.artifacts.objects.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn an_empty_render_records_nothing_and_can_be_retried() {
    let h = harness_with(RecordingSender::default(), StubRenderer::empty());
    let (_, job) = job_at_warehouse(&h).await;

    // The intake transition swallowed the failure; no record exists.
    assert!(h
        .store
        .find_document(job.id, DOC_TYPE_CUSTODY)
        .await
        .unwrap()
        .is_none());
    let err = h.documents.on_reached_intake(job.id, ACTOR).await.unwrap_err();
    assert_matches!(err, CoreError::EmptyDocument { .. });

    // Once the renderer recovers, the same trigger succeeds.
    h.renderer.set_bytes(b"%PDF-1.7 recovered".to_vec());
    let document = h.documents.on_reached_intake(job.id, ACTOR).await.unwrap();
    assert_eq!(document.job_id, job.id);
}

#[tokio::test]
async fn a_failed_intake_document_does_not_block_the_job() {
    let h = harness_with(RecordingSender::default(), StubRenderer::empty());
    let (_, job) = job_at_warehouse(&h).await;

    // The job reached warehouse despite the render failure.
    assert_eq!(job.status, "warehouse");
}

#[tokio::test]
async fn unknown_jobs_are_rejected() {
    let h = harness();
    let err = h.documents.on_reached_intake(404, ACTOR).await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "job", id: 404 });
}
