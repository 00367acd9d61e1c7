//! Image upload types.
//!
//! Decoding runs off the editing thread. A [`UploadTicket`] names the document
//! and element the result belongs to; completion is applied as one patch by
//! [`crate::interaction::complete_image_upload`].

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, ElementKind};
use crate::store::DocumentStore;
use crate::EditorResult;

/// Largest width or height an uploaded image is stored with.
pub const MAX_UPLOAD_EXTENT: f32 = 300.0;

/// Claim on an image element for a pending upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTicket {
    element: ElementId,
    document: Option<String>,
    created_at: u64,
}

impl UploadTicket {
    /// Issue a ticket for `id` if it names an image element.
    #[must_use]
    pub fn for_element(store: &DocumentStore, id: &ElementId) -> Option<Self> {
        match store.element(id).map(|e| &e.kind) {
            Some(ElementKind::Image { .. }) => Some(Self {
                element: id.clone(),
                document: store.document().id.clone(),
                created_at: store.document().created_at,
            }),
            _ => None,
        }
    }

    /// Target element.
    #[must_use]
    pub fn element(&self) -> &ElementId {
        &self.element
    }

    /// Whether the store still holds the document the ticket was issued for.
    /// A hydrate in between replaces it, even if the new document reuses the
    /// element id.
    #[must_use]
    pub fn matches_document(&self, store: &DocumentStore) -> bool {
        let current = store.document();
        current.id == self.document && current.created_at == self.created_at
    }
}

/// A decoded image ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedImage {
    /// Self-contained image reference (data URI).
    pub reference: String,
    /// Natural width in pixels.
    pub width: f32,
    /// Natural height in pixels.
    pub height: f32,
}

impl DecodedImage {
    /// Natural size capped to [`MAX_UPLOAD_EXTENT`] on each axis independently.
    #[must_use]
    pub fn capped_size(&self) -> (f32, f32) {
        (
            self.width.min(MAX_UPLOAD_EXTENT),
            self.height.min(MAX_UPLOAD_EXTENT),
        )
    }
}

/// Turns raw file bytes into a [`DecodedImage`].
pub trait ImageDecoder {
    /// Decode `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::Validation`] if the bytes are not a
    /// supported image.
    fn decode(&self, bytes: &[u8]) -> EditorResult<DecodedImage>;
}
