use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reference to one captured still image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Where the frame store persisted the raw bytes
    pub storage_ref: String,

    /// Original filename shown to the user
    pub display_name: String,

    /// Milliseconds since capture start (display only, not validated)
    pub offset_ms: u64,
}

/// One piece of speech-to-text output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// Transcribed text
    pub text: String,

    /// Milliseconds since capture start (display only, not validated)
    pub offset_ms: u64,
}

/// Read view of a capture session
///
/// Returned by value from the registry. Holding one never blocks appends,
/// and mutating it has no effect on the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSession {
    /// Capture session identifier
    pub id: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// Frames in acceptance order
    pub frames: Vec<Frame>,

    /// Transcript fragments in acceptance order
    pub transcripts: Vec<TranscriptFragment>,
}
