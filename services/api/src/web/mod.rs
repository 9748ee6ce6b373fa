pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use rest::{
    feedback_required_handler, health_handler, list_videos_handler, record_interaction_handler,
    submit_feedback_handler, ApiDoc,
};
pub use state::AppState;
pub use ws_handler::ws_handler;

/// Builds the complete application: REST routes, the swipe gateway and Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    let mut api_router = Router::new()
        .route("/health", get(health_handler))
        .route("/videos", get(list_videos_handler))
        .route("/interactions", post(record_interaction_handler))
        .route("/feedback", post(submit_feedback_handler))
        .route("/feedback/required", get(feedback_required_handler))
        .route("/ws", get(ws_handler));

    match app_state.config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => {
            let cors = CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    AUTHORIZATION,
                    CONTENT_TYPE,
                    ACCEPT,
                    HeaderName::from_static("x-user-id"),
                ]);
            api_router = api_router.layer(cors);
        }
        Err(_) => warn!(
            "CORS_ORIGIN '{}' is not a valid header value; CORS disabled.",
            app_state.config.cors_origin
        ),
    }

    let api_router = api_router
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
