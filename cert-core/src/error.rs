//! Error types for editing operations.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur while editing, persisting or exporting a document.
///
/// None of these are fatal to an editing session: the store is always left in
/// a renderable state.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Element or document not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attribute outside its allowed range.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Remote load/save failed.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Rasterization or page encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
