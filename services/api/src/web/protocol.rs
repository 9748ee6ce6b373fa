//! services/api/src/web/protocol.rs
//!
//! Wire types shared by the REST handlers, the REST client adapter and the
//! WebSocket swipe gateway, together with their mapping onto core types.

use scrollnet_core::domain::{
    Answers, EmojiKey, InteractionPayload, InteractionType, StoreIdentity, VideoDescriptor,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Response Envelope
//=========================================================================================

/// Every REST response carries a machine-readable `success` flag.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn accepted() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

//=========================================================================================
// Videos
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source_url: String,
    pub duration_seconds: u32,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl From<VideoDescriptor> for VideoDto {
    fn from(video: VideoDescriptor) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            source_url: video.source_url,
            duration_seconds: video.duration_seconds,
            tags: video.tags,
            thumbnail_url: video.thumbnail_url,
        }
    }
}

impl From<VideoDto> for VideoDescriptor {
    fn from(dto: VideoDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            description: dto.description,
            source_url: dto.source_url,
            duration_seconds: dto.duration_seconds,
            tags: dto.tags,
            thumbnail_url: dto.thumbnail_url,
        }
    }
}

#[derive(Deserialize, Serialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct ListVideosQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

//=========================================================================================
// Identity
//=========================================================================================

/// Splits a store identity into its wire fields.
pub fn identity_fields(identity: StoreIdentity) -> (Option<Uuid>, bool) {
    match identity {
        StoreIdentity::User(id) => (Some(id), false),
        StoreIdentity::Anonymous(id) => (Some(id), true),
        StoreIdentity::Unknown => (None, false),
    }
}

pub fn store_identity(identity_id: Option<Uuid>, anonymous: bool) -> StoreIdentity {
    match (identity_id, anonymous) {
        (Some(id), true) => StoreIdentity::Anonymous(id),
        (Some(id), false) => StoreIdentity::User(id),
        (None, _) => StoreIdentity::Unknown,
    }
}

//=========================================================================================
// Interactions
//=========================================================================================

/// Extra data attached to an interaction; which field is set depends on the type.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl InteractionData {
    pub fn from_payload(payload: &InteractionPayload) -> Option<Self> {
        match payload {
            InteractionPayload::None => None,
            InteractionPayload::Emoji { key } => Some(Self {
                emoji: Some(key.as_str().to_string()),
                duration_ms: None,
            }),
            InteractionPayload::View { duration_ms } => Some(Self {
                emoji: None,
                duration_ms: Some(*duration_ms),
            }),
        }
    }

    /// Interprets the data for an interaction of `kind`.
    pub fn into_payload(
        data: Option<Self>,
        kind: InteractionType,
    ) -> Result<InteractionPayload, String> {
        let data = data.unwrap_or_default();
        match kind {
            InteractionType::Like | InteractionType::Dislike => {
                if data != InteractionData::default() {
                    return Err(format!("'{}' interactions carry no data", kind));
                }
                Ok(InteractionPayload::None)
            }
            InteractionType::Emoji => {
                let raw = data
                    .emoji
                    .ok_or_else(|| "emoji interactions need an 'emoji' key".to_string())?;
                let key = raw.parse::<EmojiKey>().map_err(|e| e.to_string())?;
                Ok(InteractionPayload::Emoji { key })
            }
            InteractionType::View => Ok(match data.duration_ms {
                Some(duration_ms) => InteractionPayload::View { duration_ms },
                None => InteractionPayload::None,
            }),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<Uuid>,
    #[serde(default)]
    pub anonymous: bool,
    pub video_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionData>,
}

//=========================================================================================
// Feedback
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    /// Client-generated record id; the server mints one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<Uuid>,
    #[serde(default)]
    pub anonymous: bool,
    pub video_id: String,
    pub answers: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCreated {
    pub id: Uuid,
}

#[derive(Deserialize, Serialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FeedbackRequiredQuery {
    pub identity_id: Option<Uuid>,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequiredResponse {
    pub feedback_required: bool,
}

//=========================================================================================
// Messages Sent FROM the Client TO the Swipe Gateway
//=========================================================================================

/// Structured text messages a client can send over `/ws`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Loads the first video. Should be the first message on the connection.
    Start,
    /// A released swipe, measured from touch start.
    Gesture { dx: f64, dy: f64 },
    /// A press on one of the reaction-bar buttons.
    Emoji { key: String },
    /// Watch time on the current video.
    View { duration_ms: u64 },
    SubmitFeedback { answers: Answers },
    SkipFeedback,
    /// Restart the feed from the newest video.
    Refresh,
}

//=========================================================================================
// Messages Sent FROM the Swipe Gateway TO the Client
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// The video now on screen. `degraded` marks placeholder content.
    Video { video: VideoDto, degraded: bool },
    EndOfFeed,
    Playback { playing: bool },
    Reacted { video_id: String, key: String },
    /// Show the feedback form for `video_id`; gestures are blocked until it closes.
    FeedbackRequired { video_id: String },
    FeedbackClosed { persisted: bool },
    /// The feedback form cannot be submitted as is.
    ValidationError { message: String },
    Blocked,
    Error { message: String },
}
