use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Capture lifecycle
        .route("/captures", post(handlers::start_capture))
        .route(
            "/captures/:capture_id",
            get(handlers::get_capture_status).delete(handlers::discard_capture),
        )
        .route(
            "/captures/:capture_id/finish",
            post(handlers::finish_capture),
        )
        // Incremental uploads
        .route(
            "/captures/:capture_id/frames",
            post(handlers::upload_frame),
        )
        .route(
            "/captures/:capture_id/transcripts",
            post(handlers::upload_transcript),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
