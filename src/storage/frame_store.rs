use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Persistence for uploaded frame images
///
/// The registry only ever sees the returned storage reference.
#[async_trait::async_trait]
pub trait FrameStore: Send + Sync {
    /// Persist one frame and return a reference to it
    async fn save(&self, capture_id: &str, display_name: &str, bytes: &[u8]) -> Result<String>;

    /// Store name for logging
    fn name(&self) -> &str;
}

/// Writes frames under `<root>/<capture_id>/<uuid>.<ext>`
pub struct LocalFrameStore {
    root: PathBuf,
}

impl LocalFrameStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage reference returned by `save` to a file path
    pub fn resolve(&self, storage_ref: &str) -> PathBuf {
        self.root.join(storage_ref)
    }
}

#[async_trait::async_trait]
impl FrameStore for LocalFrameStore {
    async fn save(&self, capture_id: &str, display_name: &str, bytes: &[u8]) -> Result<String> {
        let dir_name = sanitize_component(capture_id);
        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), extension_of(display_name));

        let dir = self.root.join(&dir_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create frame directory: {:?}", dir))?;

        let path = dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write frame: {:?}", path))?;

        info!("Stored frame {} ({} bytes) for capture {}", file_name, bytes.len(), capture_id);

        Ok(format!("{}/{}", dir_name, file_name))
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Keep only `[A-Za-z0-9_-]` so an id can never escape the storage root
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

fn extension_of(display_name: &str) -> String {
    Path::new(display_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}
