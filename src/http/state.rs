use crate::capture::SessionRegistry;
use crate::storage::FrameStore;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live capture sessions
    pub registry: Arc<SessionRegistry>,

    /// Where uploaded frame bytes are persisted
    pub frames: Arc<dyn FrameStore>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, frames: Arc<dyn FrameStore>) -> Self {
        Self { registry, frames }
    }
}
