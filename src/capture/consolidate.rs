//! Consolidation of a finished capture
//!
//! Reads a session's final state exactly once, removes it from the registry,
//! and labels every frame and transcript fragment with its offset so the
//! generation client can interleave them. Items keep acceptance order;
//! offsets are used only for labels.

use super::error::RegistryError;
use super::registry::SessionRegistry;
use super::types::{Frame, TranscriptFragment};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledFrame {
    pub label: String,
    #[serde(flatten)]
    pub frame: Frame,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledLine {
    pub label: String,
    #[serde(flatten)]
    pub fragment: TranscriptFragment,
}

/// Final state of a capture, ready for a multimodal generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedCapture {
    pub capture_id: String,
    pub created_at: DateTime<Utc>,
    pub frames: Vec<LabeledFrame>,
    pub transcript: Vec<LabeledLine>,
}

impl ConsolidatedCapture {
    /// Transcript as `[label] text` lines
    pub fn transcript_text(&self) -> String {
        self.transcript
            .iter()
            .map(|line| format!("[{}] {}", line.label, line.fragment.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Take the session out of the registry and label its contents
pub async fn consolidate(
    registry: &SessionRegistry,
    capture_id: &str,
) -> Result<ConsolidatedCapture, RegistryError> {
    let session = registry.take(capture_id).await?;

    let frames = session
        .frames
        .into_iter()
        .map(|frame| LabeledFrame {
            label: format_offset(frame.offset_ms),
            frame,
        })
        .collect();

    let transcript = session
        .transcripts
        .into_iter()
        .map(|fragment| LabeledLine {
            label: format_offset(fragment.offset_ms),
            fragment,
        })
        .collect();

    Ok(ConsolidatedCapture {
        capture_id: session.id,
        created_at: session.created_at,
        frames,
        transcript,
    })
}

/// `mm:ss`, or `h:mm:ss` from one hour on
pub fn format_offset(offset_ms: u64) -> String {
    let total_secs = offset_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
