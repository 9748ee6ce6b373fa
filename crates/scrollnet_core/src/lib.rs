pub mod cadence;
pub mod classifier;
pub mod domain;
pub mod feed;
pub mod feedback;
pub mod identity;
pub mod interactions;
pub mod memory;
pub mod ports;
pub mod session;
pub mod telemetry;

pub use cadence::{CadenceSignal, CadenceTracker};
pub use classifier::{Classification, Classifier, Gesture, InteractionIntent};
pub use domain::{
    Ack, Answers, EmojiKey, FeedbackRecord, FeedbackWrite, Identity, InteractionEvent,
    InteractionPayload, InteractionType, InteractionWrite, Persistence, StoreIdentity,
    VideoDescriptor,
};
pub use feed::{FeedCursor, FeedItem, FeedPage, FeedStep};
pub use feedback::{FeedbackSubmissionClient, SubmitError};
pub use identity::SessionIdentityResolver;
pub use interactions::{InteractionQueue, InteractionStoreClient, StoreError};
pub use memory::InMemoryBackend;
pub use ports::{
    AuthProvider, AuthUser, DegradedEvent, PersistenceBackend, PortError, PortResult,
    TelemetrySink,
};
pub use session::{FeedbackPrompt, GestureOutcome, Session, SessionDeps, SessionSettings};
pub use telemetry::{RecordingTelemetry, TracingTelemetry};
