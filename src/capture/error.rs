use thiserror::Error;

/// Conditions surfaced by the session registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No live session with this identifier
    #[error("Capture session not found: {0}")]
    NotFound(String),

    /// `create` was called for an identifier that is still live
    #[error("Capture session already exists: {0}")]
    AlreadyExists(String),
}
