//! Wire-format tests for the HTTP backend against an in-process axum server

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use crabface::backend::{FaceBackend, TrainingResponse};
use crabface::config::BackendConfig;
use crabface::{CaptureError, FramePayload, HttpBackend};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorded {
    fields: Arc<Mutex<Vec<(String, String)>>>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

async fn add_user_frame(State(recorded): State<Recorded>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap();
        recorded.fields.lock().unwrap().push((name, value));
    }
    let count = recorded.fields.lock().unwrap().len() / 2;
    Json(json!({ "saved": true, "count": count }))
}

async fn rebuild_embeddings() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "error",
            "message": "No users enrolled",
            "details": "dataset directory is empty"
        })),
    )
}

async fn recognize(State(recorded): State<Recorded>, Json(frames): Json<Vec<String>>) -> Json<Value> {
    recorded.batches.lock().unwrap().push(frames);
    Json(json!({
        "result": "Alice",
        "label": "Alice",
        "similarity": 0.842,
        "reason": "match",
        "image": null,
        "image_url": "/static/last_result.jpg"
    }))
}

async fn detect_face(Json(body): Json<Value>) -> Json<Value> {
    match body.get("frame").and_then(Value::as_str) {
        Some(frame) if frame.starts_with("data:image/jpeg;base64,") => {
            Json(json!({ "detected": true, "confidence": 0.93, "image": frame }))
        }
        _ => Json(json!({ "error": "No image provided" })),
    }
}

async fn detect_rejecting() -> Json<Value> {
    Json(json!({ "error": "No image provided" }))
}

async fn detect_mixed() -> Json<Value> {
    Json(json!({ "detected": false, "confidence": 0.0, "error": "Model not loaded" }))
}

async fn detect_broken() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Malformed frame" })),
    )
}

async fn serve(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/add_user_frame", post(add_user_frame))
        .route("/rebuild_embeddings", post(rebuild_embeddings))
        .route("/recognize", post(recognize))
        .route("/detect_face", post(detect_face))
        .route("/detect_rejecting", post(detect_rejecting))
        .route("/detect_broken", post(detect_broken))
        .route("/detect_mixed", post(detect_mixed))
        .with_state(recorded);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn backend(base_url: String) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url,
        ..BackendConfig::default()
    })
    .unwrap()
}

fn frame(offset_ms: u64) -> FramePayload {
    FramePayload::new(vec![0xFF, 0xD8, 0xFF, 0xE0], 4, 3, offset_ms)
}

#[tokio::test]
async fn test_enroll_frame_is_multipart_name_and_frame() {
    let recorded = Recorded::default();
    let backend = backend(serve(recorded.clone()).await);

    let reply = backend.submit_enroll_frame("Alice", &frame(300)).await.unwrap();

    assert!(reply.saved);
    assert_eq!(reply.count, Some(1));
    let fields = recorded.fields.lock().unwrap().clone();
    assert_eq!(fields[0], ("name".to_string(), "Alice".to_string()));
    assert_eq!(fields[1].0, "frame");
    assert_eq!(fields[1].1, "data:image/jpeg;base64,/9j/4A==");
}

#[tokio::test]
async fn test_training_error_parsed_from_http_500() {
    let backend = backend(serve(Recorded::default()).await);

    let reply = backend.finalize_training().await.unwrap();

    assert_eq!(
        reply,
        TrainingResponse::Error {
            message: "No users enrolled".to_string(),
            details: Some("dataset directory is empty".to_string()),
        }
    );
}

#[tokio::test]
async fn test_recognize_sends_ordered_json_array() {
    let recorded = Recorded::default();
    let backend = backend(serve(recorded.clone()).await);
    let frames = vec![frame(180), frame(360), frame(540)];

    let reply = backend.recognize(&frames).await.unwrap();

    assert_eq!(reply.result, "Alice");
    assert!(reply.is_match());
    assert_eq!(reply.image_url.as_deref(), Some("/static/last_result.jpg"));
    assert_eq!(reply.image, None);

    let batches = recorded.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
    assert!(batches[0].iter().all(|f| f.starts_with("data:image/jpeg;base64,")));
}

#[tokio::test]
async fn test_detect_success() {
    let backend = backend(serve(Recorded::default()).await);

    let reply = backend.detect(&frame(500)).await.unwrap();

    assert!(reply.detected);
    assert_eq!(reply.status_text(), "Face detected! Confidence: 0.930");
    assert!(reply.image.is_some());
}

#[tokio::test]
async fn test_detect_error_body_is_rejection() {
    let base_url = serve(Recorded::default()).await;
    let backend = HttpBackend::new(&BackendConfig {
        base_url,
        detect_path: "/detect_rejecting".to_string(),
        ..BackendConfig::default()
    })
    .unwrap();

    let result = backend.detect(&frame(500)).await;

    assert_eq!(
        result,
        Err(CaptureError::BackendRejected("No image provided".to_string()))
    );
}

/// An error field wins over detection fields in the same reply
#[tokio::test]
async fn test_detect_error_field_wins() {
    let base_url = serve(Recorded::default()).await;
    let backend = HttpBackend::new(&BackendConfig {
        base_url,
        detect_path: "/detect_mixed".to_string(),
        ..BackendConfig::default()
    })
    .unwrap();

    let result = backend.detect(&frame(500)).await;

    assert_eq!(
        result,
        Err(CaptureError::BackendRejected("Model not loaded".to_string()))
    );
}

#[tokio::test]
async fn test_detect_http_error_is_submission_failure() {
    let base_url = serve(Recorded::default()).await;
    let backend = HttpBackend::new(&BackendConfig {
        base_url,
        detect_path: "/detect_broken".to_string(),
        ..BackendConfig::default()
    })
    .unwrap();

    let result = backend.detect(&frame(500)).await;

    assert_eq!(
        result,
        Err(CaptureError::SubmissionFailed("Malformed frame".to_string()))
    );
}
