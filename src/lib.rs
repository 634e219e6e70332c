pub mod capture;
pub mod config;
pub mod http;
pub mod storage;

pub use capture::{
    consolidate, CaptureSession, ConsolidatedCapture, Frame, RegistryConfig, RegistryError,
    SessionRegistry, Sweeper, TranscriptFragment,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use storage::{FrameStore, LocalFrameStore};
