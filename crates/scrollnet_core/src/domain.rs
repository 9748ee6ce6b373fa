//! crates/scrollnet_core/src/domain.rs
//!
//! Defines the pure, core data structures of the swipe pipeline.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Videos
//=========================================================================================

/// A playable video as handed out by the feed. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDescriptor {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Opaque, publicly resolvable media URL.
    pub source_url: String,
    pub duration_seconds: u32,
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
}

//=========================================================================================
// Identity
//=========================================================================================

/// The acting principal for an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// A stable, server-issued user id. Not guaranteed to be a UUID.
    Authenticated { id: String },
    /// A session-scoped surrogate, generated once per session.
    Anonymous { id: Uuid },
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous { .. })
    }

    /// Maps the identity onto the store's nullable identity columns.
    ///
    /// Authenticated ids that are not UUIDs cannot be stored against the user
    /// column; they degrade to `StoreIdentity::Unknown` instead of failing.
    pub fn to_store(&self) -> StoreIdentity {
        match self {
            Identity::Anonymous { id } => StoreIdentity::Anonymous(*id),
            Identity::Authenticated { id } => match Uuid::parse_str(id.trim()) {
                Ok(user_id) => StoreIdentity::User(user_id),
                Err(_) => StoreIdentity::Unknown,
            },
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Authenticated { id } => write!(f, "user:{}", id),
            Identity::Anonymous { id } => write!(f, "anon:{}", id),
        }
    }
}

/// The identity as the persistence layer sees it: two nullable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreIdentity {
    User(Uuid),
    Anonymous(Uuid),
    /// No known user; both identity columns are null.
    Unknown,
}

impl StoreIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            StoreIdentity::User(id) => Some(*id),
            _ => None,
        }
    }

    pub fn anonymous_id(&self) -> Option<Uuid> {
        match self {
            StoreIdentity::Anonymous(id) => Some(*id),
            _ => None,
        }
    }

    /// Rebuilds a store identity from its column pair. A row carrying both
    /// columns is treated as belonging to the user.
    pub fn from_columns(user_id: Option<Uuid>, anonymous_id: Option<Uuid>) -> Self {
        match (user_id, anonymous_id) {
            (Some(id), _) => StoreIdentity::User(id),
            (None, Some(id)) => StoreIdentity::Anonymous(id),
            (None, None) => StoreIdentity::Unknown,
        }
    }
}

//=========================================================================================
// Interactions
//=========================================================================================

/// The stored interaction kinds. `next` is deliberately absent: skipping a
/// video never produces a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractionType {
    Like,
    Dislike,
    Emoji,
    View,
}

impl InteractionType {
    pub const ALL: [InteractionType; 4] = [
        InteractionType::Like,
        InteractionType::Dislike,
        InteractionType::Emoji,
        InteractionType::View,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Like => "like",
            InteractionType::Dislike => "dislike",
            InteractionType::Emoji => "emoji",
            InteractionType::View => "view",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown interaction type: {0}")]
pub struct UnknownInteractionType(pub String);

impl FromStr for InteractionType {
    type Err = UnknownInteractionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InteractionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownInteractionType(s.to_string()))
    }
}

/// The fixed emoji set offered by the reaction bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmojiKey {
    Fire,
    Heart,
    Laugh,
    Wow,
    Sad,
    Angry,
    Clap,
    MindBlown,
}

impl EmojiKey {
    pub const ALL: [EmojiKey; 8] = [
        EmojiKey::Fire,
        EmojiKey::Heart,
        EmojiKey::Laugh,
        EmojiKey::Wow,
        EmojiKey::Sad,
        EmojiKey::Angry,
        EmojiKey::Clap,
        EmojiKey::MindBlown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmojiKey::Fire => "fire",
            EmojiKey::Heart => "heart",
            EmojiKey::Laugh => "laugh",
            EmojiKey::Wow => "wow",
            EmojiKey::Sad => "sad",
            EmojiKey::Angry => "angry",
            EmojiKey::Clap => "clap",
            EmojiKey::MindBlown => "mind_blown",
        }
    }
}

impl fmt::Display for EmojiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown emoji key: {0}")]
pub struct UnknownEmojiKey(pub String);

impl FromStr for EmojiKey {
    type Err = UnknownEmojiKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmojiKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownEmojiKey(s.to_string()))
    }
}

/// Typed payload carried by an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionPayload {
    None,
    Emoji { key: EmojiKey },
    View { duration_ms: u64 },
}

impl InteractionPayload {
    /// Whether this payload may accompany an interaction of `kind`.
    pub fn fits(&self, kind: InteractionType) -> bool {
        matches!(
            (kind, self),
            (InteractionType::Like, InteractionPayload::None)
                | (InteractionType::Dislike, InteractionPayload::None)
                | (InteractionType::Emoji, InteractionPayload::Emoji { .. })
                | (InteractionType::View, InteractionPayload::View { .. })
                | (InteractionType::View, InteractionPayload::None)
        )
    }
}

/// One classified user action against one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEvent {
    pub identity: Identity,
    pub video_id: String,
    pub kind: InteractionType,
    pub payload: InteractionPayload,
    pub created_at: DateTime<Utc>,
}

/// An interaction as handed to the persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionWrite {
    pub identity: StoreIdentity,
    pub video_id: String,
    pub kind: InteractionType,
    pub payload: InteractionPayload,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Feedback
//=========================================================================================

/// Free-form answers keyed by question id.
pub type Answers = BTreeMap<String, String>;

/// A completed feedback form. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub identity: Identity,
    pub video_id: String,
    pub answers: Answers,
    pub created_at: DateTime<Utc>,
}

/// A feedback record as handed to the persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackWrite {
    pub id: Uuid,
    pub identity: StoreIdentity,
    pub video_id: String,
    pub answers: Answers,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Acknowledgements
//=========================================================================================

/// Whether a write actually reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Stored,
    /// Accepted locally; the store was unreachable and the write was dropped.
    Degraded,
}

/// A value accepted by the pipeline, with the fate of its persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack<T> {
    pub value: T,
    pub persistence: Persistence,
}

impl<T> Ack<T> {
    pub fn is_degraded(&self) -> bool {
        self.persistence == Persistence::Degraded
    }
}
