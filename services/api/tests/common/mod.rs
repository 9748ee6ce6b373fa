#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::{router, AppState};
use axum::Router;
use chrono::{Duration, Utc};
use scrollnet_core::domain::VideoDescriptor;
use scrollnet_core::memory::InMemoryBackend;
use scrollnet_core::session::SessionSettings;
use scrollnet_core::telemetry::RecordingTelemetry;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::Level;

pub fn video(id: &str) -> VideoDescriptor {
    VideoDescriptor {
        id: id.to_string(),
        title: format!("Clip {id}"),
        description: format!("Description of {id}"),
        source_url: format!("https://cdn.example.com/{id}.mp4"),
        duration_seconds: 15,
        tags: vec!["demo".to_string()],
        thumbnail_url: None,
    }
}

/// A backend holding `V1..=Vcount`, `V1` newest.
pub fn seeded_backend(count: usize, cadence: u32) -> InMemoryBackend {
    let backend = InMemoryBackend::with_cadence(NonZeroU32::new(cadence).unwrap());
    let now = Utc::now();
    for i in 1..=count {
        backend.insert_video(video(&format!("V{i}")), now - Duration::minutes(i as i64));
    }
    backend
}

pub fn test_config(max_page_limit: usize, cadence: u32) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: Level::DEBUG,
        cors_origin: "http://localhost:5173".to_string(),
        max_page_limit,
        session: SessionSettings {
            cadence: NonZeroU32::new(cadence).unwrap(),
            page_size: 10,
            ..SessionSettings::default()
        },
    }
}

pub fn app(backend: &InMemoryBackend, config: Config) -> Router {
    router(Arc::new(AppState {
        backend: Arc::new(backend.clone()),
        telemetry: Arc::new(RecordingTelemetry::new()),
        config: Arc::new(config),
    }))
}

/// Serves the router on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
