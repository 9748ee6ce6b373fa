//! crates/scrollnet_core/src/session.rs
//!
//! Wires the pipeline together for one client session: gesture in, classified
//! interaction out, cadence observed, feed advanced.

use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cadence::{CadenceTracker, DEFAULT_CADENCE};
use crate::classifier::{
    Classification, Classifier, Gesture, InteractionIntent, DEFAULT_SWIPE_THRESHOLD,
};
use crate::domain::{
    Ack, Answers, EmojiKey, FeedbackRecord, Identity, InteractionPayload, InteractionType,
};
use crate::feed::{FeedCursor, FeedStep, DEFAULT_PAGE_SIZE};
use crate::feedback::{FeedbackSubmissionClient, SubmitError};
use crate::identity::SessionIdentityResolver;
use crate::interactions::{InteractionQueue, InteractionStoreClient, StoreError};
use crate::ports::{AuthProvider, PersistenceBackend, TelemetrySink};

//=========================================================================================
// Construction
//=========================================================================================

/// The collaborators a session talks to.
#[derive(Clone)]
pub struct SessionDeps {
    pub backend: Arc<dyn PersistenceBackend>,
    pub auth: Arc<dyn AuthProvider>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub swipe_threshold: f64,
    pub cadence: NonZeroU32,
    pub page_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            cadence: DEFAULT_CADENCE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

//=========================================================================================
// State and Outcomes
//=========================================================================================

/// The feedback form currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackPrompt {
    pub video_id: String,
}

/// Mutable state owned by exactly one session.
pub struct SessionState {
    pub cursor: FeedCursor,
    pub cadence: CadenceTracker,
    pub prompt: Option<FeedbackPrompt>,
    pub playing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// A tap toggled playback.
    Playback { playing: bool },
    /// The on-screen video was consumed and the feed moved on.
    Advanced {
        intent: InteractionIntent,
        next: FeedStep,
        prompt: Option<FeedbackPrompt>,
    },
    /// An emoji reaction was queued for the on-screen video.
    Reacted { video_id: String, key: EmojiKey },
    /// A feedback form is open; gestures wait until it is closed.
    Blocked,
    Ignored,
    /// Nothing left to react to.
    EndOfFeed,
}

//=========================================================================================
// The Session
//=========================================================================================

pub struct Session {
    identity: SessionIdentityResolver,
    classifier: Classifier,
    queue: InteractionQueue,
    feedback: FeedbackSubmissionClient,
    state: Mutex<SessionState>,
}

impl Session {
    /// Creates a session. Must be called from within a tokio runtime.
    pub fn new(deps: SessionDeps, settings: SessionSettings) -> Self {
        let store = InteractionStoreClient::new(deps.backend.clone(), deps.telemetry.clone());
        Self {
            identity: SessionIdentityResolver::new(deps.auth, deps.telemetry.clone()),
            classifier: Classifier::new(settings.swipe_threshold),
            queue: InteractionQueue::spawn(store),
            feedback: FeedbackSubmissionClient::new(deps.backend.clone(), deps.telemetry.clone()),
            state: Mutex::new(SessionState {
                cursor: FeedCursor::new(deps.backend, deps.telemetry, settings.page_size),
                cadence: CadenceTracker::new(settings.cadence),
                prompt: None,
                playing: true,
            }),
        }
    }

    pub fn with_anonymous_id(mut self, id: Uuid) -> Self {
        self.identity = self.identity.with_anonymous_id(id);
        self
    }

    pub async fn identity(&self) -> Identity {
        self.identity.resolve().await
    }

    /// Loads the first video.
    pub async fn start(&self) -> FeedStep {
        let mut state = self.state.lock().await;
        let step = state.cursor.current().await;
        info!(end_of_feed = step.item().is_none(), "session started");
        step
    }

    /// Re-fetches the feed from the top, e.g. after a reconnect.
    pub async fn refresh(&self) -> FeedStep {
        self.state.lock().await.cursor.refresh().await
    }

    pub async fn handle_gesture(&self, gesture: Gesture) -> GestureOutcome {
        let mut state = self.state.lock().await;
        match self.classifier.classify(gesture) {
            Classification::Ignored => GestureOutcome::Ignored,
            _ if state.prompt.is_some() => GestureOutcome::Blocked,
            Classification::Tap => {
                state.playing = !state.playing;
                GestureOutcome::Playback {
                    playing: state.playing,
                }
            }
            Classification::Intent(InteractionIntent::Emoji(key)) => {
                self.react(&mut state, key).await
            }
            Classification::Intent(intent) => self.consume(&mut state, intent).await,
        }
    }

    pub async fn press_emoji(&self, key: EmojiKey) -> GestureOutcome {
        let mut state = self.state.lock().await;
        if state.prompt.is_some() {
            return GestureOutcome::Blocked;
        }
        self.react(&mut state, key).await
    }

    /// Queues a `view` interaction for the on-screen video.
    pub async fn record_view(&self, duration_ms: u64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let step = state.cursor.current().await;
        let Some(item) = step.item() else {
            return Ok(());
        };
        if item.degraded {
            return Ok(());
        }
        let identity = self.identity.resolve().await;
        self.queue.enqueue(
            identity,
            &item.video.id,
            InteractionType::View,
            InteractionPayload::View { duration_ms },
        )
    }

    pub async fn feedback_prompt(&self) -> Option<FeedbackPrompt> {
        self.state.lock().await.prompt.clone()
    }

    /// Submits the open feedback form.
    ///
    /// A validation failure keeps the form open. Anything else closes it and
    /// restarts the cadence, whether or not the backend stored the record.
    pub async fn submit_feedback(
        &self,
        answers: Answers,
    ) -> Result<Ack<FeedbackRecord>, SubmitError> {
        let mut state = self.state.lock().await;
        let Some(prompt) = state.prompt.clone() else {
            return Err(SubmitError::InvalidInput("no feedback form is open".to_string()));
        };

        let identity = self.identity.resolve().await;
        let ack = self
            .feedback
            .submit(identity.clone(), &prompt.video_id, answers)
            .await?;

        state.prompt = None;
        state.cadence.reset(&identity);
        Ok(ack)
    }

    /// Closes the open feedback form without creating a record.
    pub async fn skip_feedback(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.prompt.take().is_none() {
            return false;
        }
        let identity = self.identity.resolve().await;
        state.cadence.reset(&identity);
        debug!(%identity, "feedback skipped");
        true
    }

    /// Asks the backend's cadence check instead of the local tracker.
    pub async fn feedback_due_remotely(&self) -> bool {
        let identity = self.identity.resolve().await;
        self.feedback.required_remotely(&identity).await
    }

    /// Mints a new anonymous id for this session, for when the previous one
    /// can no longer be trusted. Signed-in sessions keep acting as their user;
    /// the new id only applies while no user is signed in.
    ///
    /// The cadence window restarts because it is keyed by identity.
    pub fn regenerate_anonymous_id(&mut self) -> Uuid {
        self.identity.regenerate()
    }

    /// Waits until every queued interaction has been attempted.
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    pub async fn videos_consumed(&self) -> usize {
        self.state.lock().await.cursor.videos_consumed()
    }

    async fn react(&self, state: &mut SessionState, key: EmojiKey) -> GestureOutcome {
        let step = state.cursor.current().await;
        let Some(item) = step.item() else {
            return GestureOutcome::EndOfFeed;
        };
        if !item.degraded {
            let identity = self.identity.resolve().await;
            if let Err(e) = self.queue.enqueue(
                identity,
                &item.video.id,
                InteractionType::Emoji,
                InteractionPayload::Emoji { key },
            ) {
                warn!(video_id = %item.video.id, "emoji reaction not queued: {}", e);
            }
        }
        GestureOutcome::Reacted {
            video_id: item.video.id.clone(),
            key,
        }
    }

    async fn consume(&self, state: &mut SessionState, intent: InteractionIntent) -> GestureOutcome {
        let step = state.cursor.current().await;
        let Some(item) = step.item() else {
            return GestureOutcome::EndOfFeed;
        };

        let mut prompt = None;
        if !item.degraded {
            let identity = self.identity.resolve().await;
            let kind = match intent {
                InteractionIntent::Like => Some(InteractionType::Like),
                InteractionIntent::Dislike => Some(InteractionType::Dislike),
                InteractionIntent::Next | InteractionIntent::Emoji(_) => None,
            };
            if let Some(kind) = kind {
                let queued = self.queue.enqueue(
                    identity.clone(),
                    &item.video.id,
                    kind,
                    InteractionPayload::None,
                );
                if let Err(e) = queued {
                    warn!(video_id = %item.video.id, %kind, "interaction not queued: {}", e);
                }
            }

            let signal = state.cadence.on_video_consumed(&identity, &item.video.id);
            if let Some(video_id) = signal
                .video_id_for_feedback
                .filter(|_| signal.feedback_required)
            {
                prompt = Some(FeedbackPrompt { video_id });
                state.prompt = prompt.clone();
            }
        }

        let next = state.cursor.advance().await;
        state.playing = true;
        GestureOutcome::Advanced {
            intent,
            next,
            prompt,
        }
    }
}
