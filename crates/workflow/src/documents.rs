//! Chain-of-custody document generation.
//!
//! Triggered once per job when the goods reach warehouse intake. The
//! rendered bytes land in an [`ArtifactStore`]; the record row is
//! keyed `(job, doc_type)` so concurrent triggers converge on a single
//! document.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use reloop_core::types::DbId;
use reloop_core::CoreError;
use reloop_db::models::{
    Booking, CustodyDocument, EvidenceRecord, Job, JobLineItem, DOC_TYPE_CUSTODY,
};

use crate::store::WorkflowStore;

/// Everything the renderer needs to lay out a custody document.
#[derive(Debug, Clone, Serialize)]
pub struct CustodyPayload {
    pub job: Job,
    pub booking: Booking,
    pub line_items: Vec<JobLineItem>,
    pub evidence: Vec<EvidenceRecord>,
}

/// Renders a custody payload to document bytes.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, payload: &CustodyPayload) -> Result<Vec<u8>, CoreError>;
}

/// Stores rendered document bytes under a key.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CoreError>;
}

/// Artifact store over a local directory.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CoreError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::Internal(format!("creating artifact dir: {e}")))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("writing artifact {}: {e}", path.display())))
    }
}

/// Default cap on a single render call.
const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Generates the custody document when a job reaches warehouse intake.
pub struct DocumentService {
    store: Arc<dyn WorkflowStore>,
    renderer: Arc<dyn DocumentRenderer>,
    artifacts: Arc<dyn ArtifactStore>,
    render_timeout: Duration,
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        renderer: Arc<dyn DocumentRenderer>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            store,
            renderer,
            artifacts,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Produce the custody document for `job_id`, once.
    ///
    /// Returns the existing record when the document was already
    /// generated; a failed attempt records nothing, so the next trigger
    /// retries from scratch.
    pub async fn on_reached_intake(
        &self,
        job_id: DbId,
        actor_id: DbId,
    ) -> Result<CustodyDocument, CoreError> {
        if let Some(existing) = self.store.find_document(job_id, DOC_TYPE_CUSTODY).await? {
            tracing::debug!(job_id, document_id = existing.id, "Custody document already exists");
            return Ok(existing);
        }

        let job = self
            .store
            .find_job(job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "job",
                id: job_id,
            })?;
        let booking = self
            .store
            .find_booking(job.booking_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "booking",
                id: job.booking_id,
            })?;
        let payload = CustodyPayload {
            line_items: self.store.list_line_items(job_id).await?,
            evidence: self.store.list_evidence(job_id).await?,
            job,
            booking,
        };

        let bytes = tokio::time::timeout(self.render_timeout, self.renderer.render(&payload))
            .await
            .map_err(|_| CoreError::Internal(format!("custody render timed out for job {job_id}")))??;
        if bytes.is_empty() {
            return Err(CoreError::EmptyDocument { job_id });
        }

        let storage_key = format!("custody/{}.pdf", payload.job.job_reference);
        self.artifacts.put(&storage_key, &bytes).await?;

        match self
            .store
            .insert_document_once(
                job_id,
                DOC_TYPE_CUSTODY,
                &storage_key,
                bytes.len() as i64,
                actor_id,
            )
            .await?
        {
            Some(document) => {
                tracing::info!(
                    job_id,
                    document_id = document.id,
                    storage_key,
                    size_bytes = document.size_bytes,
                    "Custody document generated"
                );
                Ok(document)
            }
            // A concurrent trigger finished first; its row wins.
            None => self
                .store
                .find_document(job_id, DOC_TYPE_CUSTODY)
                .await?
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "custody document for job {job_id} vanished after conflict"
                    ))
                }),
        }
    }
}
