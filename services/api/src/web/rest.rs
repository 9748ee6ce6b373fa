//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition of the OpenAPI document.

use crate::error::ApiError;
use crate::web::protocol::{
    store_identity, ApiResponse, FeedbackCreated, FeedbackRequest, FeedbackRequiredQuery,
    FeedbackRequiredResponse, InteractionData, InteractionRequest, ListVideosQuery, VideoDto,
};
use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use scrollnet_core::domain::{FeedbackWrite, InteractionType, InteractionWrite};
use scrollnet_core::{feedback, interactions};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_videos_handler,
        record_interaction_handler,
        submit_feedback_handler,
        feedback_required_handler,
    ),
    components(
        schemas(
            HealthResponse,
            VideoDto,
            InteractionData,
            InteractionRequest,
            FeedbackRequest,
            FeedbackCreated,
            FeedbackRequiredResponse,
        )
    ),
    tags(
        (name = "ScrollNet API", description = "Feed, interaction and feedback endpoints for the swipe client.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse { status: "ok" }))
}

/// List active videos, newest first.
#[utoipa::path(
    get,
    path = "/videos",
    params(ListVideosQuery),
    responses(
        (status = 200, description = "A page of videos in the success envelope", body = [VideoDto]),
        (status = 400, description = "Offset out of range"),
        (status = 503, description = "Video store unavailable")
    )
)]
pub async fn list_videos_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListVideosQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let config = &app_state.config;
    let limit = query
        .limit
        .unwrap_or(config.session.page_size)
        .clamp(1, config.max_page_limit);
    let offset = query.offset.unwrap_or(0);
    if i64::try_from(offset).is_err() {
        return Err(ApiError::BadRequest(format!("offset {} is out of range", offset)));
    }

    let videos = app_state.backend.list_videos(offset, limit).await?;
    let videos: Vec<VideoDto> = videos.into_iter().map(VideoDto::from).collect();
    Ok(Json(ApiResponse::ok(videos)))
}

/// Record an interaction. Repeats for the same (identity, video, type) overwrite the row.
#[utoipa::path(
    post,
    path = "/interactions",
    request_body = InteractionRequest,
    responses(
        (status = 200, description = "Interaction stored"),
        (status = 400, description = "Unknown type, missing video id or mismatched data"),
        (status = 503, description = "Interaction store unavailable")
    )
)]
pub async fn record_interaction_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<InteractionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = req
        .kind
        .parse::<InteractionType>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let payload =
        InteractionData::into_payload(req.data, kind).map_err(ApiError::BadRequest)?;
    interactions::validate(&req.video_id, kind, &payload)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let write = InteractionWrite {
        identity: store_identity(req.identity_id, req.anonymous),
        video_id: req.video_id,
        kind,
        payload,
        created_at: Utc::now(),
    };
    debug!(video_id = %write.video_id, %kind, "recording interaction");
    app_state.backend.upsert_interaction(write).await?;

    Ok((StatusCode::OK, Json(ApiResponse::accepted())))
}

/// Store a completed feedback form.
#[utoipa::path(
    post,
    path = "/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback stored", body = FeedbackCreated),
        (status = 400, description = "No non-empty answer, or missing video id"),
        (status = 503, description = "Feedback store unavailable")
    )
)]
pub async fn submit_feedback_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    feedback::validate(&req.video_id, &req.answers)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let id = req.id.unwrap_or_else(Uuid::new_v4);
    let write = FeedbackWrite {
        id,
        identity: store_identity(req.identity_id, req.anonymous),
        video_id: req.video_id,
        answers: req.answers,
        created_at: Utc::now(),
    };
    app_state.backend.insert_feedback(write).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(FeedbackCreated { id }))))
}

/// Server-side cadence check.
#[utoipa::path(
    get,
    path = "/feedback/required",
    params(FeedbackRequiredQuery),
    responses(
        (status = 200, description = "Whether a feedback form is due", body = FeedbackRequiredResponse),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn feedback_required_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<FeedbackRequiredQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = store_identity(query.identity_id, query.anonymous);
    let feedback_required = app_state.backend.feedback_required(identity).await?;
    Ok(Json(ApiResponse::ok(FeedbackRequiredResponse {
        feedback_required,
    })))
}
