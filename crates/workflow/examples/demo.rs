//! Run a full collection lifecycle against the in-memory store.
//!
//! ```sh
//! cargo run -p reloop-workflow --example demo
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use reloop_core::evidence::NewEvidence;
use reloop_core::status::JobStatus;
use reloop_core::types::EntityKind;
use reloop_core::CoreError;
use reloop_events::bus::EventBus;
use reloop_events::delivery::LogSender;
use reloop_workflow::documents::{CustodyPayload, DocumentRenderer};
use reloop_workflow::{
    DispatcherConfig, DocumentService, FlatRateValuer, FsArtifactStore, MemoryStore,
    NotificationDispatcher, Orchestrator, StatusTarget, WorkflowStore,
};

/// Renders the custody payload as pretty JSON instead of a PDF.
struct JsonRenderer;

#[async_trait]
impl DocumentRenderer for JsonRenderer {
    async fn render(&self, payload: &CustodyPayload) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec_pretty(payload)
            .map_err(|e| CoreError::Internal(format!("serializing custody payload: {e}")))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let artifacts_dir = tempfile::tempdir()?;
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(EventBus::new(64));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        store.clone(),
        Arc::new(LogSender),
        DispatcherConfig {
            admin_ids: vec![100],
            reseller_ids: vec![200],
        },
    ));
    let documents = Arc::new(DocumentService::new(
        store.clone(),
        Arc::new(JsonRenderer),
        Arc::new(FsArtifactStore::new(artifacts_dir.path())),
    ));
    let orchestrator = Orchestrator::new(
        store.clone(),
        bus,
        dispatcher,
        documents,
        Arc::new(FlatRateValuer),
    );

    let client = 10;
    let driver = 20;
    let operator = 1;

    let booking = orchestrator.create_booking(client, None, operator).await?;
    let booking = orchestrator.approve_booking(booking.id, operator).await?;
    let (booking, job) = orchestrator.assign_driver(booking.id, driver, operator).await?;

    for status in [JobStatus::EnRoute, JobStatus::Arrived] {
        orchestrator
            .apply_status_change(job.id, StatusTarget::Job(status), driver, None)
            .await?;
    }
    let pickup = NewEvidence {
        photo_keys: vec!["photos/van-loaded.jpg".into()],
        signature_key: Some("signatures/site-contact.png".into()),
        seal_numbers: vec!["SEAL-0451".into()],
        notes: Some("14 assets on two pallets".into()),
    };
    orchestrator
        .submit_evidence(job.id, JobStatus::Collected, pickup, driver)
        .await?;
    orchestrator
        .submit_evidence(
            job.id,
            JobStatus::Warehouse,
            NewEvidence {
                photo_keys: vec!["photos/intake-bay.jpg".into()],
                ..Default::default()
            },
            operator,
        )
        .await?;

    let laptops = orchestrator.add_line_item(job.id, "laptop", 12).await?;
    let drives = orchestrator.add_line_item(job.id, "loose_drive", 2).await?;
    orchestrator.sanitise_line(laptops.id, "software_wipe", operator).await?;
    orchestrator.sanitise_line(drives.id, "shred", operator).await?;
    let laptops = orchestrator.grade_line(laptops.id, "a", operator).await?;
    orchestrator.grade_line(drives.id, "scrap", operator).await?;
    let job = orchestrator.complete_job(job.id, operator).await?;

    let booking = store.find_booking(booking.id).await?.unwrap();
    println!("booking {} finished as '{}'", booking.booking_number, booking.status);
    println!(
        "job {} finished as '{}', laptops valued at {}p",
        job.job_reference,
        job.status,
        laptops.resale_value_pence.unwrap_or(0)
    );
    for entry in store.list_status_history(EntityKind::Job, job.id).await? {
        println!("  job history: {} (actor {})", entry.status, entry.actor_id);
    }

    Ok(())
}
