// Integration tests for the capture HTTP API
//
// Requests are driven through the router in-process; frames land in a
// temporary directory.

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use base64::Engine;
use lecture_capture::{create_router, AppState, LocalFrameStore, RegistryConfig, SessionRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    registry: Arc<SessionRegistry>,
    frames: Arc<LocalFrameStore>,
    _storage: TempDir,
}

fn setup() -> Result<TestApp> {
    setup_with(RegistryConfig::default())
}

fn setup_with(config: RegistryConfig) -> Result<TestApp> {
    let storage = TempDir::new()?;
    let registry = Arc::new(SessionRegistry::new(config));
    let frames = Arc::new(LocalFrameStore::new(storage.path()));

    let router = create_router(AppState::new(Arc::clone(&registry), frames.clone()));

    Ok(TestApp {
        router,
        registry,
        frames,
        _storage: storage,
    })
}

async fn request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Option<Value>)> {
    let builder = Request::builder().method(method).uri(path);

    let request = match body {
        Some(json_body) => builder
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

    let json_body = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes)?)
    };

    Ok((status, json_body))
}

fn frame_body(bytes: &[u8], name: &str, offset_ms: u64) -> Value {
    json!({
        "image_base64": base64::engine::general_purpose::STANDARD.encode(bytes),
        "display_name": name,
        "offset_ms": offset_ms,
    })
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let app = setup()?;
    app.registry.create("one").await?;

    let (status, body) = request(&app.router, Method::GET, "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("Expected response body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["live_sessions"], 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_health_counts_only_unexpired_sessions() -> Result<()> {
    let app = setup_with(RegistryConfig {
        idle_ttl: Duration::from_millis(50),
        sweep_interval: Duration::from_secs(60),
    })?;
    app.registry.create("stale").await?;
    tokio::time::sleep(Duration::from_millis(120)).await;
    app.registry.create("fresh").await?;

    let (status, body) = request(&app.router, Method::GET, "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.expect("Expected response body")["live_sessions"], 1);

    Ok(())
}

#[tokio::test]
async fn test_start_capture_generates_id() -> Result<()> {
    let app = setup()?;

    let (status, body) = request(&app.router, Method::POST, "/captures", Some(json!({}))).await?;

    assert_eq!(status, StatusCode::CREATED);
    let capture_id = body.expect("Expected response body")["capture_id"]
        .as_str()
        .expect("capture_id should be a string")
        .to_string();
    assert!(uuid::Uuid::parse_str(&capture_id).is_ok(), "Got {}", capture_id);
    assert!(app.registry.exists(&capture_id).await);

    Ok(())
}

#[tokio::test]
async fn test_start_capture_conflicts_on_live_id() -> Result<()> {
    let app = setup()?;
    let body = json!({ "capture_id": "lecture-1" });

    let (first, _) = request(&app.router, Method::POST, "/captures", Some(body.clone())).await?;
    let (second, error) = request(&app.router, Method::POST, "/captures", Some(body)).await?;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(error.expect("Expected error body")["error"]
        .as_str()
        .unwrap_or_default()
        .contains("lecture-1"));

    Ok(())
}

#[tokio::test]
async fn test_full_capture_flow() -> Result<()> {
    let app = setup()?;
    request(&app.router, Method::POST, "/captures", Some(json!({ "capture_id": "c1" }))).await?;

    let (status, body) = request(
        &app.router,
        Method::POST,
        "/captures/c1/transcripts",
        Some(json!({ "text": "hello", "offset_ms": 1000 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.expect("body")["transcript_count"], 1);

    let (status, body) = request(
        &app.router,
        Method::POST,
        "/captures/c1/frames",
        Some(frame_body(b"image-bytes", "x.jpg", 1200)),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.expect("body")["frame_count"], 1);

    let (status, body) = request(&app.router, Method::GET, "/captures/c1", None).await?;
    assert_eq!(status, StatusCode::OK);
    let body = body.expect("body");
    assert_eq!(body["frame_count"], 1);
    assert_eq!(body["transcript_count"], 1);

    let (status, body) = request(&app.router, Method::POST, "/captures/c1/finish", None).await?;
    assert_eq!(status, StatusCode::OK);
    let body = body.expect("body");
    assert_eq!(body["capture_id"], "c1");
    assert_eq!(body["transcript"][0]["text"], "hello");
    assert_eq!(body["transcript"][0]["label"], "00:01");
    assert_eq!(body["frames"][0]["display_name"], "x.jpg");
    assert_eq!(body["frames"][0]["offset_ms"], 1200);

    let storage_ref = body["frames"][0]["storage_ref"].as_str().expect("storage_ref");
    assert_eq!(std::fs::read(app.frames.resolve(storage_ref))?, b"image-bytes");

    // Finishing releases the session
    assert!(!app.registry.exists("c1").await);
    let (status, _) = request(&app.router, Method::GET, "/captures/c1", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_upload_to_unstarted_capture_upserts() -> Result<()> {
    let app = setup()?;

    let (status, body) = request(
        &app.router,
        Method::POST,
        "/captures/fresh/frames",
        Some(frame_body(b"x", "a.png", 0)),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.expect("body")["frame_count"], 1);
    assert!(app.registry.exists("fresh").await);

    Ok(())
}

#[tokio::test]
async fn test_invalid_base64_is_rejected() -> Result<()> {
    let app = setup()?;

    let (status, body) = request(
        &app.router,
        Method::POST,
        "/captures/c1/frames",
        Some(json!({ "image_base64": "not base64!!", "display_name": "a.jpg", "offset_ms": 0 })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.expect("body")["error"].is_string());
    assert!(!app.registry.exists("c1").await, "Rejected upload must not create a session");

    Ok(())
}

#[tokio::test]
async fn test_unknown_capture_returns_not_found() -> Result<()> {
    let app = setup()?;

    let (status, _) = request(&app.router, Method::GET, "/captures/nope", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&app.router, Method::POST, "/captures/nope/finish", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_discard_capture_is_idempotent() -> Result<()> {
    let app = setup()?;
    app.registry.append_transcript("gone", "x", 0).await;

    let (first, _) = request(&app.router, Method::DELETE, "/captures/gone", None).await?;
    let (second, _) = request(&app.router, Method::DELETE, "/captures/gone", None).await?;

    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);
    assert!(!app.registry.exists("gone").await);

    Ok(())
}
