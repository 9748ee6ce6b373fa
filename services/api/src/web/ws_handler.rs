//! services/api/src/web/ws_handler.rs
//!
//! The swipe gateway: one pipeline `Session` per WebSocket connection, driven
//! by client messages and answered with server messages.

use crate::{
    adapters::StaticAuthProvider,
    web::{
        protocol::{ClientMessage, ServerMessage},
        state::AppState,
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use scrollnet_core::{
    classifier::Gesture,
    domain::EmojiKey,
    feed::FeedStep,
    feedback::SubmitError,
    ports::AuthProvider,
    session::{GestureOutcome, Session},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let auth: Arc<dyn AuthProvider> = Arc::new(StaticAuthProvider::from_headers(&headers));
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, auth))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, auth: Arc<dyn AuthProvider>) {
    let (mut sender, mut receiver) = socket.split();
    let session = Session::new(app_state.session_deps(auth), app_state.config.session);
    let identity = session.identity().await;
    info!(identity = %identity, "Swipe session opened.");

    'connection: while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                info!("Client sent close message.");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("WebSocket receive failed: {}", e);
                break;
            }
        };

        let replies = match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(message) => handle_client_message(&session, message).await,
            Err(e) => vec![ServerMessage::Error {
                message: format!("Unrecognised message: {}", e),
            }],
        };

        for reply in replies {
            let json = match serde_json::to_string(&reply) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialise server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                error!("Failed to send message to client. Closing session.");
                break 'connection;
            }
        }
    }

    // Interaction writes still queued are abandoned with the session.
    let consumed = session.videos_consumed().await;
    info!(consumed = consumed, "Swipe session closed.");
}

/// Applies one client message to the session and returns the replies, in order.
async fn handle_client_message(session: &Session, message: ClientMessage) -> Vec<ServerMessage> {
    match message {
        ClientMessage::Start => vec![step_message(session.start().await)],
        ClientMessage::Refresh => vec![step_message(session.refresh().await)],
        ClientMessage::Gesture { dx, dy } => {
            outcome_messages(session.handle_gesture(Gesture::new(dx, dy)).await)
        }
        ClientMessage::Emoji { key } => match key.parse::<EmojiKey>() {
            Ok(key) => outcome_messages(session.press_emoji(key).await),
            Err(e) => vec![ServerMessage::Error {
                message: e.to_string(),
            }],
        },
        ClientMessage::View { duration_ms } => match session.record_view(duration_ms).await {
            Ok(()) => Vec::new(),
            Err(e) => vec![ServerMessage::Error {
                message: e.to_string(),
            }],
        },
        ClientMessage::SubmitFeedback { answers } => {
            match session.submit_feedback(answers).await {
                Ok(ack) => vec![ServerMessage::FeedbackClosed {
                    persisted: !ack.is_degraded(),
                }],
                Err(e @ SubmitError::Validation) => vec![ServerMessage::ValidationError {
                    message: e.to_string(),
                }],
                Err(e) => vec![ServerMessage::Error {
                    message: e.to_string(),
                }],
            }
        }
        ClientMessage::SkipFeedback => {
            if session.skip_feedback().await {
                vec![ServerMessage::FeedbackClosed { persisted: false }]
            } else {
                vec![ServerMessage::Error {
                    message: "no feedback form is open".to_string(),
                }]
            }
        }
    }
}

fn step_message(step: FeedStep) -> ServerMessage {
    match step {
        FeedStep::Video(item) => ServerMessage::Video {
            video: item.video.into(),
            degraded: item.degraded,
        },
        FeedStep::EndOfFeed => ServerMessage::EndOfFeed,
    }
}

fn outcome_messages(outcome: GestureOutcome) -> Vec<ServerMessage> {
    match outcome {
        GestureOutcome::Playback { playing } => vec![ServerMessage::Playback { playing }],
        GestureOutcome::Advanced { next, prompt, .. } => {
            let mut messages = vec![step_message(next)];
            if let Some(prompt) = prompt {
                messages.push(ServerMessage::FeedbackRequired {
                    video_id: prompt.video_id,
                });
            }
            messages
        }
        GestureOutcome::Reacted { video_id, key } => vec![ServerMessage::Reacted {
            video_id,
            key: key.as_str().to_string(),
        }],
        GestureOutcome::Blocked => vec![ServerMessage::Blocked],
        GestureOutcome::Ignored => Vec::new(),
        GestureOutcome::EndOfFeed => vec![ServerMessage::EndOfFeed],
    }
}
