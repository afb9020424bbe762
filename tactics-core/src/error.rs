//! Error types for board operations.

use thiserror::Error;

/// Result type for board operations.
pub type TacticsResult<T> = Result<T, TacticsError>;

/// Errors that can occur in board operations.
#[derive(Debug, Error)]
pub enum TacticsError {
    /// The surface is too small to hold a field; the caller should retry
    /// once the surface has a real size.
    #[error("Field geometry not ready")]
    GeometryNotReady,

    /// Element not found on the board.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A referenced external entity (player, icon asset) cannot be resolved.
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// A layout record is structurally valid JSON but cannot become an element.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Layout serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TacticsError {
    /// Whether the operation should simply be retried later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::GeometryNotReady)
    }
}
