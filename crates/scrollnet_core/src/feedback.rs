//! crates/scrollnet_core/src/feedback.rs
//!
//! Submits completed feedback forms.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Ack, Answers, FeedbackRecord, FeedbackWrite, Identity, Persistence};
use crate::ports::{DegradedEvent, PersistenceBackend, TelemetrySink};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Shown inline on the form; the submit button stays blocked.
    #[error("Please answer at least one question")]
    Validation,
    #[error("Invalid feedback: {0}")]
    InvalidInput(String),
}

/// At least one answer must carry a non-blank value.
pub fn validate(video_id: &str, answers: &Answers) -> Result<(), SubmitError> {
    if video_id.trim().is_empty() {
        return Err(SubmitError::InvalidInput("video id is required".to_string()));
    }
    if !answers.values().any(|a| !a.trim().is_empty()) {
        return Err(SubmitError::Validation);
    }
    Ok(())
}

#[derive(Clone)]
pub struct FeedbackSubmissionClient {
    backend: Arc<dyn PersistenceBackend>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl FeedbackSubmissionClient {
    pub fn new(backend: Arc<dyn PersistenceBackend>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self { backend, telemetry }
    }

    pub async fn submit(
        &self,
        identity: Identity,
        video_id: &str,
        answers: Answers,
    ) -> Result<Ack<FeedbackRecord>, SubmitError> {
        validate(video_id, &answers)?;

        let record = FeedbackRecord {
            id: Uuid::new_v4(),
            identity,
            video_id: video_id.to_string(),
            answers,
            created_at: Utc::now(),
        };
        let write = FeedbackWrite {
            id: record.id,
            identity: record.identity.to_store(),
            video_id: record.video_id.clone(),
            answers: record.answers.clone(),
            created_at: record.created_at,
        };

        let persistence = match self.backend.insert_feedback(write).await {
            Ok(()) => {
                debug!(feedback_id = %record.id, video_id = %record.video_id, "feedback stored");
                Persistence::Stored
            }
            Err(e) => {
                self.telemetry.record(DegradedEvent::FeedbackDropped {
                    video_id: record.video_id.clone(),
                    reason: e.to_string(),
                });
                Persistence::Degraded
            }
        };

        Ok(Ack {
            value: record,
            persistence,
        })
    }

    /// Asks the backend whether feedback is due. Any failure reads as "not due".
    pub async fn required_remotely(&self, identity: &Identity) -> bool {
        match self.backend.feedback_required(identity.to_store()).await {
            Ok(required) => required,
            Err(e) => {
                warn!(%identity, "server-side cadence check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InteractionPayload, InteractionType, InteractionWrite};
    use crate::memory::InMemoryBackend;
    use crate::telemetry::RecordingTelemetry;

    fn client() -> (FeedbackSubmissionClient, InMemoryBackend, RecordingTelemetry) {
        let backend = InMemoryBackend::new();
        let telemetry = RecordingTelemetry::new();
        let client =
            FeedbackSubmissionClient::new(Arc::new(backend.clone()), Arc::new(telemetry.clone()));
        (client, backend, telemetry)
    }

    fn answers(pairs: &[(&str, &str)]) -> Answers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn anon() -> Identity {
        Identity::Anonymous { id: Uuid::new_v4() }
    }

    #[tokio::test]
    async fn empty_answers_fail_validation_and_store_nothing() {
        let (client, backend, _) = client();
        let result = client.submit(anon(), "v1", Answers::new()).await;
        assert_eq!(result.unwrap_err(), SubmitError::Validation);

        let blank = client.submit(anon(), "v1", answers(&[("q1", "   ")])).await;
        assert_eq!(blank.unwrap_err(), SubmitError::Validation);
        assert!(backend.feedback().is_empty());
    }

    #[tokio::test]
    async fn one_answer_is_enough() {
        let (client, backend, _) = client();
        let identity = anon();
        let ack = client
            .submit(identity.clone(), "v1", answers(&[("q1", "x")]))
            .await
            .unwrap();
        assert_eq!(ack.persistence, Persistence::Stored);

        let stored = backend.feedback();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, ack.value.id);
        assert_eq!(stored[0].identity, identity.to_store());
    }

    #[tokio::test]
    async fn repeat_submissions_are_all_kept() {
        let (client, backend, _) = client();
        let identity = anon();
        for answer in ["first", "second"] {
            client
                .submit(identity.clone(), "v1", answers(&[("q1", answer)]))
                .await
                .unwrap();
        }
        assert_eq!(backend.feedback().len(), 2);
    }

    #[tokio::test]
    async fn offline_store_accepts_locally() {
        let (client, backend, telemetry) = client();
        backend.set_offline(true);
        let ack = client
            .submit(anon(), "v1", answers(&[("q1", "x")]))
            .await
            .unwrap();
        assert!(ack.is_degraded());
        assert!(matches!(
            telemetry.events().as_slice(),
            [DegradedEvent::FeedbackDropped { .. }]
        ));
    }

    #[tokio::test]
    async fn remote_cadence_failure_reads_as_not_required() {
        let (client, backend, _) = client();
        backend.set_offline(true);
        assert!(!client.required_remotely(&anon()).await);
    }

    #[tokio::test]
    async fn remote_cadence_reflects_backend() {
        let (client, backend, _) = client();
        let identity = anon();
        assert!(!client.required_remotely(&identity).await);

        for i in 1..=5 {
            backend
                .upsert_interaction(InteractionWrite {
                    identity: identity.to_store(),
                    video_id: format!("v{i}"),
                    kind: InteractionType::Like,
                    payload: InteractionPayload::None,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        assert!(client.required_remotely(&identity).await);
    }
}
