use std::sync::Arc;

use super::*;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::Intent;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct UploadLog {
    received: Arc<Mutex<Vec<(String, String, usize)>>>,
}

async fn slow_fusion() -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(400)).await;
    Json(json!({"action": "ZOOM_IN", "status": "APPROVED", "score": 0.9, "timestamp": 1.0}))
}

async fn fast_fusion() -> Json<Value> {
    Json(json!({
        "action": "SHOW_CT_SCAN",
        "status": "APPROVED",
        "reason": "gaze + voice agree",
        "score": 0.93,
        "timestamp": 1_700_000_000.5
    }))
}

async fn samples() -> Json<Value> {
    Json(json!([
        "chest.png",
        {"filename": "brain.jpg", "uploaded_at": "2024-05-01T10:00:00Z", "size": 2048}
    ]))
}

async fn vision() -> Json<Value> {
    Json(json!({"object_detected": "ct_scan", "confidence": 0.71, "timestamp": 3.0, "gaze": [0.2, 0.4]}))
}

async fn voice() -> Json<Value> {
    Json(json!({"transcript": "zoom in on the left", "intent": "ZOOM_IN", "confidence": 0.88}))
}

async fn accept_upload(State(log): State<UploadLog>, mut multipart: Multipart) -> Json<Value> {
    let mut filename = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        log.received
            .lock()
            .await
            .push((field_name, content_type, bytes));
    }
    Json(json!({"saved": {"name": filename}, "path": "samples"}))
}

async fn reject_upload() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"error": "unsupported file type"})),
    )
}

async fn spawn_backend(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[test]
fn channel_url_follows_server_scheme() {
    let api = DashboardApi::new("http://127.0.0.1:5000").expect("api");
    assert_eq!(api.channel_url().expect("ws").as_str(), "ws://127.0.0.1:5000/ws");

    let api = DashboardApi::new("https://imaging.example.org/dashboard").expect("api");
    assert_eq!(
        api.channel_url().expect("wss").as_str(),
        "wss://imaging.example.org/dashboard/ws"
    );
}

#[test]
fn sample_url_escapes_file_names() {
    let api = DashboardApi::new("http://localhost:5000/").expect("api");
    assert_eq!(
        api.sample_url("knee scan#2.png").as_str(),
        "http://localhost:5000/samples/knee%20scan%232.png"
    );
}

#[test]
fn base_url_gains_trailing_slash() {
    let api = DashboardApi::new("http://localhost:5000/api").expect("api");
    assert_eq!(api.base_url().as_str(), "http://localhost:5000/api/");
}

#[test]
fn rejects_non_http_server_urls() {
    assert!(matches!(
        DashboardApi::new("ftp://localhost"),
        Err(ClientError::UnsupportedScheme(_))
    ));
    assert!(matches!(
        DashboardApi::new("not a url"),
        Err(ClientError::InvalidUrl { .. })
    ));
}

#[tokio::test]
async fn slow_fusion_falls_back_to_simulated_decision() {
    let base = spawn_backend(Router::new().route("/fusion", get(slow_fusion))).await;
    let api = DashboardApi::new(&base).expect("api");

    let reading = api
        .fusion_or_simulated(Duration::from_millis(50), &TelemetryFallback::new(), 0.0)
        .await;
    assert_eq!(reading.source, TelemetrySource::Simulated);
    assert_eq!(reading.decision, TelemetryFallback::new().sample(0.0));
}

#[tokio::test]
async fn fusion_within_deadline_is_live() {
    let base = spawn_backend(Router::new().route("/fusion", get(fast_fusion))).await;
    let api = DashboardApi::new(&base).expect("api");

    let reading = api
        .fusion_or_simulated(DEFAULT_FUSION_TIMEOUT, &TelemetryFallback::new(), 0.0)
        .await;
    assert_eq!(reading.source, TelemetrySource::Live);
    assert_eq!(reading.decision.action, "SHOW_CT_SCAN");
    assert_eq!(reading.decision.reason.as_deref(), Some("gaze + voice agree"));
}

#[tokio::test]
async fn unreachable_backend_times_out_or_fails() {
    let api = DashboardApi::new("http://127.0.0.1:9").expect("api");
    let err = api.fusion(Duration::from_millis(200)).await.expect_err("no backend");
    assert!(matches!(
        err,
        ClientError::Transport { endpoint: "fusion", .. } | ClientError::Timeout { endpoint: "fusion" }
    ));
}

#[tokio::test]
async fn samples_listing_normalizes_mixed_shapes() {
    let base = spawn_backend(Router::new().route("/samples", get(samples))).await;
    let api = DashboardApi::new(&base).expect("api");

    let images = api.list_samples().await.expect("samples");
    assert_eq!(images.len(), 2);
    assert_eq!(images[0], ImageRef::named("chest.png"));
    assert_eq!(images[1].name, "brain.jpg");
    assert_eq!(images[1].size, Some(2048));
    assert_eq!(images[1].uploaded_at.as_deref(), Some("2024-05-01T10:00:00Z"));
}

#[tokio::test]
async fn telemetry_snapshots_decode() {
    let base = spawn_backend(
        Router::new()
            .route("/vision", get(vision))
            .route("/voice", get(voice)),
    )
    .await;
    let api = DashboardApi::new(&base).expect("api");

    let vision = api.vision().await.expect("vision");
    assert_eq!(vision.object_label(), Some("ct_scan"));
    assert!(vision.extra.contains_key("gaze"));

    let voice = api.voice().await.expect("voice");
    assert_eq!(voice.intent, Intent::ZoomIn);
    assert_eq!(voice.transcript, "zoom in on the left");
}

#[tokio::test]
async fn upload_sends_file_part_and_returns_saved_reference() {
    let log = UploadLog::default();
    let base = spawn_backend(
        Router::new()
            .route("/upload", post(accept_upload))
            .with_state(log.clone()),
    )
    .await;
    let api = DashboardApi::new(&base).expect("api");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("x.png");
    tokio::fs::write(&path, vec![7u8; 64]).await.expect("write");

    let image = api.upload_file(&path).await.expect("upload");
    assert_eq!(image.name, "x.png");
    assert_eq!(image.size, Some(64));

    let received = log.received.lock().await.clone();
    assert_eq!(received, vec![("file".to_string(), "image/png".to_string(), 64)]);
}

#[tokio::test]
async fn upload_rejection_carries_backend_message() {
    let base = spawn_backend(Router::new().route("/upload", post(reject_upload))).await;
    let api = DashboardApi::new(&base).expect("api");

    let err = api
        .upload_bytes("notes.txt", b"hello".to_vec())
        .await
        .expect_err("rejected");
    match err {
        UploadError::Rejected { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "unsupported file type");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn upload_of_missing_file_fails_before_sending() {
    let api = DashboardApi::new("http://127.0.0.1:9").expect("api");
    let err = api
        .upload_file(Path::new("/definitely/not/here.png"))
        .await
        .expect_err("missing");
    assert!(matches!(err, UploadError::ReadFile { .. }));
}
