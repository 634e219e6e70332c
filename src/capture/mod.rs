//! Live capture session registry
//!
//! This module provides the in-process store behind live lecture capture:
//! - `SessionRegistry`: keyed, per-session locked accumulation of frames and transcripts
//! - `Sweeper`: periodic eviction of idle sessions
//! - `consolidate`: one-shot read-and-evict of a finished capture

mod config;
mod consolidate;
mod error;
mod registry;
mod sweeper;
mod types;

pub use config::RegistryConfig;
pub use consolidate::{consolidate, format_offset, ConsolidatedCapture, LabeledFrame, LabeledLine};
pub use error::RegistryError;
pub use registry::SessionRegistry;
pub use sweeper::Sweeper;
pub use types::{CaptureSession, Frame, TranscriptFragment};
