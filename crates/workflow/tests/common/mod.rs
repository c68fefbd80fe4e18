//! Shared harness for workflow integration tests.
//!
//! Everything runs against the in-memory store with recording fakes at
//! the delivery and rendering seams, so tests observe exactly which
//! side effects fired.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use reloop_core::evidence::NewEvidence;
use reloop_core::status::JobStatus;
use reloop_core::types::DbId;
use reloop_core::CoreError;
use reloop_db::models::{Booking, Job};
use reloop_events::bus::EventBus;
use reloop_events::delivery::{DeliveryError, NotificationSender};
use reloop_workflow::documents::{ArtifactStore, CustodyPayload, DocumentRenderer};
use reloop_workflow::{
    DispatcherConfig, DocumentService, FlatRateValuer, MemoryStore, NotificationDispatcher,
    Orchestrator, StatusTarget,
};
// Trait methods on `Harness::store` need this in scope in every suite.
pub use reloop_workflow::WorkflowStore;

pub const ACTOR: DbId = 1;
pub const CLIENT: DbId = 10;
pub const DRIVER: DbId = 20;
pub const ADMIN: DbId = 100;
pub const RESELLER: DbId = 200;

/// Sender that records every delivery instead of sending.
#[derive(Default)]
pub struct RecordingSender {
    pub delivered: Mutex<Vec<(DbId, String)>>,
    pub fail: bool,
    pub hang: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Sender whose `deliver` never resolves.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn deliveries(&self) -> Vec<(DbId, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn deliver(
        &self,
        recipient_id: DbId,
        title: &str,
        _message: &str,
        _link: &str,
    ) -> Result<(), DeliveryError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.delivered
            .lock()
            .unwrap()
            .push((recipient_id, title.to_string()));
        if self.fail {
            Err(DeliveryError::Transport("wire down".into()))
        } else {
            Ok(())
        }
    }
}

/// Renderer returning whatever bytes the test configures.
pub struct StubRenderer {
    bytes: Mutex<Vec<u8>>,
}

impl StubRenderer {
    pub fn pdf() -> Self {
        Self {
            bytes: Mutex::new(b"%PDF-1.7 stub".to_vec()),
        }
    }

    pub fn empty() -> Self {
        Self {
            bytes: Mutex::new(Vec::new()),
        }
    }

    pub fn set_bytes(&self, bytes: Vec<u8>) {
        *self.bytes.lock().unwrap() = bytes;
    }
}

#[async_trait]
impl DocumentRenderer for StubRenderer {
    async fn render(&self, _payload: &CustodyPayload) -> Result<Vec<u8>, CoreError> {
        Ok(self.bytes.lock().unwrap().clone())
    }
}

/// Artifact store writing into a map.
#[derive(Default)]
pub struct MemoryArtifacts {
    pub objects: Mutex<Vec<String>>,
}

#[async_trait]
impl ArtifactStore for MemoryArtifacts {
    async fn put(&self, key: &str, _bytes: &[u8]) -> Result<(), CoreError> {
        self.objects.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub bus: Arc<EventBus>,
    pub sender: Arc<RecordingSender>,
    pub renderer: Arc<StubRenderer>,
    pub artifacts: Arc<MemoryArtifacts>,
    pub documents: Arc<DocumentService>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub orchestrator: Orchestrator,
}

pub fn harness() -> Harness {
    harness_with(RecordingSender::default(), StubRenderer::pdf())
}

pub fn harness_with(sender: RecordingSender, renderer: StubRenderer) -> Harness {
    harness_inner(sender, renderer, None)
}

pub fn harness_with_delivery_timeout(
    sender: RecordingSender,
    renderer: StubRenderer,
    timeout: std::time::Duration,
) -> Harness {
    harness_inner(sender, renderer, Some(timeout))
}

fn harness_inner(
    sender: RecordingSender,
    renderer: StubRenderer,
    delivery_timeout: Option<std::time::Duration>,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(EventBus::new(64));
    let sender = Arc::new(sender);
    let renderer = Arc::new(renderer);
    let artifacts = Arc::new(MemoryArtifacts::default());
    let mut dispatcher = NotificationDispatcher::new(
        store.clone(),
        sender.clone(),
        DispatcherConfig {
            admin_ids: vec![ADMIN],
            reseller_ids: vec![RESELLER],
        },
    );
    if let Some(timeout) = delivery_timeout {
        dispatcher = dispatcher.with_delivery_timeout(timeout);
    }
    let dispatcher = Arc::new(dispatcher);
    let documents = Arc::new(DocumentService::new(
        store.clone(),
        renderer.clone(),
        artifacts.clone(),
    ));
    let orchestrator = Orchestrator::new(
        store.clone(),
        bus.clone(),
        dispatcher.clone(),
        documents.clone(),
        Arc::new(FlatRateValuer),
    );
    Harness {
        store,
        bus,
        sender,
        renderer,
        artifacts,
        documents,
        dispatcher,
        orchestrator,
    }
}

/// One photo, no signature; passes validation.
pub fn photo_evidence() -> NewEvidence {
    NewEvidence {
        photo_keys: vec!["photos/front.jpg".into()],
        signature_key: None,
        seal_numbers: vec!["SEAL-001".into()],
        notes: None,
    }
}

/// Booking approved and a driver assigned: booking `scheduled`, job
/// `routed`.
pub async fn scheduled_booking(h: &Harness) -> (Booking, Job) {
    let booking = h
        .orchestrator
        .create_booking(CLIENT, None, ACTOR)
        .await
        .unwrap();
    let booking = h
        .orchestrator
        .approve_booking(booking.id, ACTOR)
        .await
        .unwrap();
    h.orchestrator
        .assign_driver(booking.id, DRIVER, ACTOR)
        .await
        .unwrap()
}

/// Drive the job through collection up to warehouse intake.
pub async fn job_at_warehouse(h: &Harness) -> (Booking, Job) {
    let (booking, job) = scheduled_booking(h).await;
    for status in [JobStatus::EnRoute, JobStatus::Arrived] {
        h.orchestrator
            .apply_status_change(job.id, StatusTarget::Job(status), ACTOR, None)
            .await
            .unwrap();
    }
    h.orchestrator
        .submit_evidence(job.id, JobStatus::Collected, photo_evidence(), DRIVER)
        .await
        .unwrap();
    h.orchestrator
        .submit_evidence(job.id, JobStatus::Warehouse, photo_evidence(), ACTOR)
        .await
        .unwrap();
    let booking = h.store.find_booking(booking.id).await.unwrap().unwrap();
    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    (booking, job)
}
