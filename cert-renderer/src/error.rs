//! Renderer error types.

use cert_core::EditorError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rasterizing, encoding or decoding.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The generated SVG could not be parsed.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Pixmap allocation or drawing failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// PNG or PDF encoding failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Uploaded bytes are not a supported image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<RenderError> for EditorError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Decode(_) => Self::Validation(err.to_string()),
            other => Self::Export(other.to_string()),
        }
    }
}
