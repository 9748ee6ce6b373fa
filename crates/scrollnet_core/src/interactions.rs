//! crates/scrollnet_core/src/interactions.rs
//!
//! Persists classified interactions against the backend. Writes are
//! best-effort: a store failure is logged and reported, never surfaced.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{
    Ack, Identity, InteractionEvent, InteractionPayload, InteractionType, InteractionWrite,
    Persistence, StoreIdentity,
};
use crate::ports::{DegradedEvent, PersistenceBackend, TelemetrySink};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid interaction: {0}")]
    InvalidInput(String),
}

/// Checks an interaction before anything leaves the client.
pub fn validate(
    video_id: &str,
    kind: InteractionType,
    payload: &InteractionPayload,
) -> Result<(), StoreError> {
    if video_id.trim().is_empty() {
        return Err(StoreError::InvalidInput("video id is required".to_string()));
    }
    if !payload.fits(kind) {
        return Err(StoreError::InvalidInput(format!(
            "payload {:?} does not belong to a '{}' interaction",
            payload, kind
        )));
    }
    Ok(())
}

//=========================================================================================
// The Store Client
//=========================================================================================

#[derive(Clone)]
pub struct InteractionStoreClient {
    backend: Arc<dyn PersistenceBackend>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl InteractionStoreClient {
    pub fn new(backend: Arc<dyn PersistenceBackend>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self { backend, telemetry }
    }

    /// Upserts the (identity, video, type) row.
    ///
    /// Only `InvalidInput` is ever returned; an unreachable store yields a
    /// `Degraded` acknowledgement instead.
    pub async fn record(
        &self,
        identity: Identity,
        video_id: &str,
        kind: InteractionType,
        payload: InteractionPayload,
    ) -> Result<Ack<InteractionEvent>, StoreError> {
        validate(video_id, kind, &payload)?;

        let event = InteractionEvent {
            identity,
            video_id: video_id.to_string(),
            kind,
            payload,
            created_at: Utc::now(),
        };

        let store_identity = event.identity.to_store();
        if store_identity == StoreIdentity::Unknown {
            debug!(identity = %event.identity, "identity not storable, recording without a user");
        }

        let write = InteractionWrite {
            identity: store_identity,
            video_id: event.video_id.clone(),
            kind,
            payload: event.payload.clone(),
            created_at: event.created_at,
        };

        let persistence = match self.backend.upsert_interaction(write).await {
            Ok(()) => {
                debug!(video_id = %event.video_id, %kind, "interaction recorded");
                Persistence::Stored
            }
            Err(e) => {
                self.telemetry.record(DegradedEvent::InteractionDropped {
                    video_id: event.video_id.clone(),
                    kind,
                    reason: e.to_string(),
                });
                Persistence::Degraded
            }
        };

        Ok(Ack {
            value: event,
            persistence,
        })
    }
}

//=========================================================================================
// The Fire-and-Forget Queue
//=========================================================================================

enum Job {
    Record {
        identity: Identity,
        video_id: String,
        kind: InteractionType,
        payload: InteractionPayload,
    },
    Flush(oneshot::Sender<()>),
}

/// A single worker task per session that drains interaction writes in the
/// order they were enqueued. Dropping the queue abandons pending writes.
pub struct InteractionQueue {
    sender: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
}

impl InteractionQueue {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(client: InteractionStoreClient) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                match job {
                    Job::Record {
                        identity,
                        video_id,
                        kind,
                        payload,
                    } => {
                        if let Err(e) = client.record(identity, &video_id, kind, payload).await {
                            warn!(%video_id, %kind, "queued interaction rejected: {}", e);
                        }
                    }
                    Job::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { sender, worker }
    }

    /// Validates synchronously, then queues the write without waiting on it.
    pub fn enqueue(
        &self,
        identity: Identity,
        video_id: &str,
        kind: InteractionType,
        payload: InteractionPayload,
    ) -> Result<(), StoreError> {
        validate(video_id, kind, &payload)?;
        let job = Job::Record {
            identity,
            video_id: video_id.to_string(),
            kind,
            payload,
        };
        if self.sender.send(job).is_err() {
            warn!(%video_id, %kind, "interaction worker gone, dropping write");
        }
        Ok(())
    }

    /// Resolves once every write enqueued before this call has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

impl Drop for InteractionQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
