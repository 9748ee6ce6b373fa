mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use common::{app, seeded_backend, test_config};
use scrollnet_core::domain::{InteractionPayload, InteractionType, StoreIdentity};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(&seeded_backend(0, 5), test_config(50, 5));
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn videos_are_newest_first_and_paged() {
    let backend = seeded_backend(5, 5);
    let app = app(&backend, test_config(50, 5));

    let (status, first) = call(&app, Method::GET, "/videos?limit=2&offset=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&first), ["V1", "V2"]);

    let (_, second) = call(&app, Method::GET, "/videos?limit=2&offset=2", None).await;
    assert_eq!(ids(&second), ["V3", "V4"]);

    let (_, video) = call(&app, Method::GET, "/videos?limit=1", None).await;
    assert_eq!(video["data"][0]["sourceUrl"], "https://cdn.example.com/V1.mp4");
    assert_eq!(video["data"][0]["durationSeconds"], 15);
}

#[tokio::test]
async fn inactive_videos_are_hidden() {
    let backend = seeded_backend(3, 5);
    backend.deactivate_video("V2");
    let app = app(&backend, test_config(50, 5));

    let (_, body) = call(&app, Method::GET, "/videos", None).await;
    assert_eq!(ids(&body), ["V1", "V3"]);
}

#[tokio::test]
async fn video_limit_is_clamped() {
    let backend = seeded_backend(8, 5);
    let app = app(&backend, test_config(3, 5));

    let (_, body) = call(&app, Method::GET, "/videos?limit=100", None).await;
    assert_eq!(ids(&body).len(), 3);

    let (_, body) = call(&app, Method::GET, "/videos?limit=0", None).await;
    assert_eq!(ids(&body).len(), 1);
}

#[tokio::test]
async fn offset_beyond_the_database_range_is_a_bad_request() {
    let backend = seeded_backend(2, 5);
    let app = app(&backend, test_config(50, 5));

    let uri = format!("/videos?offset={}", u64::MAX);
    let (status, body) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let uri = format!("/videos?offset={}", i64::MAX);
    let (status, body) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn offline_store_answers_503_envelope() {
    let backend = seeded_backend(2, 5);
    backend.set_offline(true);
    let app = app(&backend, test_config(50, 5));

    let (status, body) = call(&app, Method::GET, "/videos", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn repeated_interaction_overwrites_one_row() {
    let backend = seeded_backend(1, 5);
    let app = app(&backend, test_config(50, 5));
    let anon = Uuid::new_v4();

    for duration in [1200, 4800] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/interactions",
            Some(json!({
                "identityId": anon,
                "anonymous": true,
                "videoId": "V1",
                "type": "view",
                "data": { "durationMs": duration }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    assert_eq!(backend.interactions().len(), 1);
    let row = backend
        .interaction(StoreIdentity::Anonymous(anon), "V1", InteractionType::View)
        .unwrap();
    assert_eq!(row.payload, InteractionPayload::View { duration_ms: 4800 });
}

#[tokio::test]
async fn unknown_interaction_type_is_rejected() {
    let backend = seeded_backend(1, 5);
    let app = app(&backend, test_config(50, 5));

    let (status, body) = call(
        &app,
        Method::POST,
        "/interactions",
        Some(json!({
            "anonymous": true,
            "identityId": Uuid::new_v4(),
            "videoId": "V1",
            "type": "share"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(backend.interactions().is_empty());
}

#[tokio::test]
async fn interaction_without_video_is_rejected() {
    let backend = seeded_backend(1, 5);
    let app = app(&backend, test_config(50, 5));

    let (status, _) = call(
        &app,
        Method::POST,
        "/interactions",
        Some(json!({ "identityId": Uuid::new_v4(), "videoId": "  ", "type": "like" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_feedback_is_a_validation_failure() {
    let backend = seeded_backend(1, 5);
    let app = app(&backend, test_config(50, 5));

    let (status, body) = call(
        &app,
        Method::POST,
        "/feedback",
        Some(json!({
            "identityId": Uuid::new_v4(),
            "anonymous": true,
            "videoId": "V1",
            "answers": { "mood": "   " }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(backend.feedback().is_empty());
}

#[tokio::test]
async fn feedback_is_stored_and_resets_the_remote_cadence() {
    let backend = seeded_backend(3, 2);
    let app = app(&backend, test_config(50, 2));
    let user = Uuid::new_v4();
    let required_uri = format!("/feedback/required?identityId={user}&anonymous=false");

    for video in ["V1", "V2"] {
        call(
            &app,
            Method::POST,
            "/interactions",
            Some(json!({ "identityId": user, "videoId": video, "type": "like" })),
        )
        .await;
    }
    let (status, body) = call(&app, Method::GET, &required_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["feedbackRequired"], true);

    let (status, body) = call(
        &app,
        Method::POST,
        "/feedback",
        Some(json!({
            "identityId": user,
            "videoId": "V2",
            "answers": { "mood": "great", "pace": "" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["id"].is_string());

    let stored = backend.feedback();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].identity, StoreIdentity::User(user));
    assert_eq!(stored[0].video_id, "V2");

    let (_, body) = call(&app, Method::GET, &required_uri, None).await;
    assert_eq!(body["data"]["feedbackRequired"], false);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app(&seeded_backend(0, 5), test_config(50, 5));
    let (status, body) = call(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/videos"].is_object());
    assert!(body["paths"]["/feedback/required"].is_object());
}
