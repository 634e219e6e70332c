//! HTTP API for live lecture capture
//!
//! This module provides the REST endpoints the capture client talks to:
//! - POST /captures - Start a capture session
//! - POST /captures/:id/frames - Upload one frame (base64 JSON)
//! - POST /captures/:id/transcripts - Upload one transcript fragment
//! - GET /captures/:id - Query session status
//! - POST /captures/:id/finish - Consolidate and release the session
//! - DELETE /captures/:id - Discard the session
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
