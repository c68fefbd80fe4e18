//! Evidence ledger behaviour at the collection and intake handovers.

mod common;

use assert_matches::assert_matches;
use common::*;

use reloop_core::evidence::NewEvidence;
use reloop_core::status::JobStatus;
use reloop_core::CoreError;
use reloop_workflow::StatusTarget;

async fn job_at_arrived(h: &Harness) -> reloop_db::models::Job {
    let (_, job) = scheduled_booking(h).await;
    for status in [JobStatus::EnRoute, JobStatus::Arrived] {
        h.orchestrator
            .apply_status_change(job.id, StatusTarget::Job(status), ACTOR, None)
            .await
            .unwrap();
    }
    h.store.find_job(job.id).await.unwrap().unwrap()
}

#[tokio::test]
async fn evidence_without_photo_or_signature_is_rejected() {
    let h = harness();
    let job = job_at_arrived(&h).await;

    let empty = NewEvidence {
        photo_keys: vec!["   ".into()],
        signature_key: None,
        seal_numbers: vec![],
        notes: Some("nothing attached".into()),
    };
    let err = h
        .orchestrator
        .submit_evidence(job.id, JobStatus::Collected, empty, DRIVER)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::EmptyEvidence);

    // Nothing was recorded and the job did not move.
    assert!(h.store.list_evidence(job.id).await.unwrap().is_empty());
    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, "arrived");
}

#[tokio::test]
async fn evidence_for_non_work_stages_is_rejected() {
    let h = harness();
    let (_, job) = scheduled_booking(&h).await;

    for status in [JobStatus::Booked, JobStatus::Cancelled] {
        let err = h
            .orchestrator
            .submit_evidence(job.id, status, photo_evidence(), DRIVER)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }
    assert!(h.store.list_evidence(job.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn a_signature_alone_is_sufficient() {
    let h = harness();
    let job = job_at_arrived(&h).await;

    let signed = NewEvidence {
        photo_keys: vec![],
        signature_key: Some("signatures/site-contact.png".into()),
        seal_numbers: vec![],
        notes: None,
    };
    let (record, updated) = h
        .orchestrator
        .submit_evidence(job.id, JobStatus::Collected, signed, DRIVER)
        .await
        .unwrap();
    assert!(record.photo_keys.is_empty());
    assert_eq!(updated.unwrap().status, "collected");
}

#[tokio::test]
async fn valid_evidence_advances_the_job_to_the_attested_status() {
    let h = harness();
    let job = job_at_arrived(&h).await;

    let (record, updated) = h
        .orchestrator
        .submit_evidence(job.id, JobStatus::Collected, photo_evidence(), DRIVER)
        .await
        .unwrap();
    assert_eq!(record.status, "collected");
    assert_eq!(record.submitted_by, DRIVER);
    assert_eq!(updated.unwrap().status, "collected");
}

#[tokio::test]
async fn duplicate_evidence_for_a_status_is_rejected() {
    let h = harness();
    let job = job_at_arrived(&h).await;
    h.orchestrator
        .submit_evidence(job.id, JobStatus::Collected, photo_evidence(), DRIVER)
        .await
        .unwrap();

    let err = h
        .orchestrator
        .submit_evidence(job.id, JobStatus::Collected, photo_evidence(), DRIVER)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::DuplicateEvidence { status: "collected", .. });
    assert_eq!(h.store.list_evidence(job.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn late_evidence_is_recorded_without_a_transition() {
    let h = harness();
    let job = job_at_arrived(&h).await;
    // Move through collection and intake without the pickup evidence.
    for status in [JobStatus::Collected, JobStatus::Warehouse] {
        h.orchestrator
            .apply_status_change(job.id, StatusTarget::Job(status), ACTOR, None)
            .await
            .unwrap();
    }

    let (record, updated) = h
        .orchestrator
        .submit_evidence(job.id, JobStatus::Collected, photo_evidence(), DRIVER)
        .await
        .unwrap();
    assert_eq!(record.status, "collected");
    assert!(updated.is_none());
    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, "warehouse");
}

#[tokio::test]
async fn evidence_fields_are_trimmed_and_blanks_dropped() {
    let h = harness();
    let job = job_at_arrived(&h).await;

    let messy = NewEvidence {
        photo_keys: vec!["  photos/a.jpg  ".into(), "".into()],
        signature_key: Some("  ".into()),
        seal_numbers: vec![" SEAL-9 ".into(), "   ".into()],
        notes: Some("  left at loading bay  ".into()),
    };
    let (record, _) = h
        .orchestrator
        .submit_evidence(job.id, JobStatus::Collected, messy, DRIVER)
        .await
        .unwrap();
    assert_eq!(record.photo_keys, ["photos/a.jpg"]);
    assert_eq!(record.signature_key, None);
    assert_eq!(record.seal_numbers, ["SEAL-9"]);
    assert_eq!(record.notes.as_deref(), Some("left at loading bay"));
}
