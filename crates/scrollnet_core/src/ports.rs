//! crates/scrollnet_core/src/ports.rs
//!
//! Defines the service contracts (traits) the swipe pipeline depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! pipeline independent of the concrete auth provider, database or REST client.

use async_trait::async_trait;

use crate::domain::{
    FeedbackWrite, InteractionType, InteractionWrite, StoreIdentity, VideoDescriptor,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The collaborator could not be reached at all.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The collaborator answered, but refused the request (non-2xx or `success: false`).
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The signed-in user, as supplied by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub token: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns the currently signed-in user, or `None` when browsing anonymously.
    async fn current_user(&self) -> PortResult<Option<AuthUser>>;
}

#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Active videos only, newest first (`created_at DESC, id DESC`).
    async fn list_videos(&self, offset: usize, limit: usize) -> PortResult<Vec<VideoDescriptor>>;

    /// Inserts or overwrites the single row for (identity, video, type).
    async fn upsert_interaction(&self, write: InteractionWrite) -> PortResult<()>;

    /// Insert-only; repeated submissions for one video are all kept.
    async fn insert_feedback(&self, write: FeedbackWrite) -> PortResult<()>;

    /// Server-side cadence check for `identity`.
    async fn feedback_required(&self, identity: StoreIdentity) -> PortResult<bool>;
}

/// A best-effort failure that was absorbed instead of surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedEvent {
    InteractionDropped {
        video_id: String,
        kind: InteractionType,
        reason: String,
    },
    FeedbackDropped {
        video_id: String,
        reason: String,
    },
    FeedFallback {
        offset: usize,
        reason: String,
    },
    IdentityResolutionFailure {
        reason: String,
    },
}

/// Receives every degraded-mode event so that silent data loss stays observable.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: DegradedEvent);
}
