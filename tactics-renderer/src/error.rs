//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// The requested output has no pixels.
    #[error("Invalid output size: {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Render settings could not be parsed.
    #[error("Invalid render settings: {0}")]
    Config(#[from] serde_json::Error),

    /// Rasterization or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),
}
