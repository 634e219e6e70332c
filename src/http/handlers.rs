use super::state::AppState;
use crate::capture::{self, RegistryError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCaptureRequest {
    /// Optional capture ID (if not provided, generate UUID)
    pub capture_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartCaptureResponse {
    pub capture_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct FrameUploadRequest {
    /// Base64-encoded image bytes
    pub image_base64: String,

    /// Original filename (e.g. "frame-0001.jpg")
    pub display_name: String,

    /// Milliseconds since capture start
    pub offset_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct FrameUploadResponse {
    pub capture_id: String,
    pub frame_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptUploadRequest {
    pub text: String,

    /// Milliseconds since capture start
    pub offset_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct TranscriptUploadResponse {
    pub capture_id: String,
    pub transcript_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CaptureStatusResponse {
    pub capture_id: String,
    pub created_at: DateTime<Utc>,
    pub frame_count: usize,
    pub transcript_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub live_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn registry_error_response(err: RegistryError) -> Response {
    let status = match err {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::AlreadyExists(_) => StatusCode::CONFLICT,
    };
    error_response(status, err.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /captures
/// Start a new capture session
pub async fn start_capture(
    State(state): State<AppState>,
    Json(req): Json<StartCaptureRequest>,
) -> impl IntoResponse {
    let capture_id = req
        .capture_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    match state.registry.create(&capture_id).await {
        Ok(session) => {
            info!("Capture started: {}", capture_id);
            (
                StatusCode::CREATED,
                Json(StartCaptureResponse {
                    capture_id,
                    created_at: session.created_at,
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Refusing to start capture: {}", e);
            registry_error_response(e)
        }
    }
}

/// POST /captures/:capture_id/frames
/// Persist one captured frame and append it to the session
pub async fn upload_frame(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
    Json(req): Json<FrameUploadRequest>,
) -> impl IntoResponse {
    let bytes = match base64::engine::general_purpose::STANDARD.decode(req.image_base64.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid image_base64: {}", e));
        }
    };

    let storage_ref = match state.frames.save(&capture_id, &req.display_name, &bytes).await {
        Ok(storage_ref) => storage_ref,
        Err(e) => {
            error!("Failed to store frame for {} via {}: {:#}", capture_id, state.frames.name(), e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store frame: {}", e),
            );
        }
    };

    let frame_count = state
        .registry
        .append_frame(&capture_id, storage_ref, req.display_name, req.offset_ms)
        .await;

    (
        StatusCode::OK,
        Json(FrameUploadResponse {
            capture_id,
            frame_count,
        }),
    )
        .into_response()
}

/// POST /captures/:capture_id/transcripts
/// Append one transcript fragment to the session
pub async fn upload_transcript(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
    Json(req): Json<TranscriptUploadRequest>,
) -> impl IntoResponse {
    let transcript_count = state
        .registry
        .append_transcript(&capture_id, req.text, req.offset_ms)
        .await;

    (
        StatusCode::OK,
        Json(TranscriptUploadResponse {
            capture_id,
            transcript_count,
        }),
    )
        .into_response()
}

/// GET /captures/:capture_id
/// Get status of a capture session
pub async fn get_capture_status(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
) -> impl IntoResponse {
    match state.registry.get(&capture_id).await {
        Ok(session) => (
            StatusCode::OK,
            Json(CaptureStatusResponse {
                capture_id: session.id,
                created_at: session.created_at,
                frame_count: session.frames.len(),
                transcript_count: session.transcripts.len(),
            }),
        )
            .into_response(),
        Err(e) => registry_error_response(e),
    }
}

/// POST /captures/:capture_id/finish
/// Consolidate the capture for generation and release it
pub async fn finish_capture(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
) -> impl IntoResponse {
    match capture::consolidate(&state.registry, &capture_id).await {
        Ok(consolidated) => {
            info!(
                "Capture finished: {} ({} frames, {} transcript lines)",
                capture_id,
                consolidated.frames.len(),
                consolidated.transcript.len()
            );
            (StatusCode::OK, Json(consolidated)).into_response()
        }
        Err(e) => {
            error!("Failed to finish capture: {}", e);
            registry_error_response(e)
        }
    }
}

/// DELETE /captures/:capture_id
/// Discard a capture session
///
/// Only the registry entry is released. Frames already written by the frame
/// store stay on disk, as they do when a session expires.
pub async fn discard_capture(
    State(state): State<AppState>,
    Path(capture_id): Path<String>,
) -> impl IntoResponse {
    if state.registry.evict(&capture_id).await {
        info!("Capture discarded: {}", capture_id);
    }

    StatusCode::NO_CONTENT
}

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            live_sessions: state.registry.live_count().await,
        }),
    )
}
