//! Document store: the single source of truth for the document being edited.
//!
//! All mutation goes through [`DocumentStore`] so invariants live in one
//! place. The store is single-threaded: it is owned by the editing thread and
//! mutated through `&mut self`, so no locking is needed.
//!
//! # Example
//!
//! ```
//! use cert_core::store::DocumentStore;
//! use cert_core::{ElementPatch, ElementType};
//!
//! let mut store = DocumentStore::new();
//! let id = store.create_element(ElementType::Text);
//! store
//!     .update_element(&id, &ElementPatch::content("Certificate of Merit"))
//!     .unwrap();
//! assert_eq!(store.selection(), Some(&id));
//! ```

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::document::{Document, NEW_DOCUMENT_NAME};
use crate::element::{Element, ElementId, ElementPatch, ElementType, PageBorder};
use crate::geometry::CanvasSize;
use crate::zorder;
use crate::{EditorError, EditorResult};

/// Owns a document plus the editor's selection.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    document: Document,
    canvas: CanvasSize,
    selection: Option<ElementId>,
    /// Monotonic id counter; never rewinds, even across `hydrate`.
    next_seq: u64,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Create a store holding an empty document on the default canvas.
    #[must_use]
    pub fn new() -> Self {
        Self::with_canvas(CanvasSize::default())
    }

    /// Create a store holding an empty document on the given canvas.
    #[must_use]
    pub fn with_canvas(canvas: CanvasSize) -> Self {
        Self {
            document: Document::new(NEW_DOCUMENT_NAME, current_timestamp_ms()),
            canvas,
            selection: None,
            next_seq: 1,
        }
    }

    /// Canvas size in document pixels.
    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Read-only view of the current document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Look up an element.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.document.element(id)
    }

    /// Currently selected element, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&ElementId> {
        self.selection.as_ref()
    }

    /// The selected element, if it still exists.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        self.selection.as_ref().and_then(|id| self.document.element(id))
    }

    /// Select an element, or clear the selection with `None`.
    ///
    /// Selecting an id that does not exist clears the selection.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selection = id.filter(|id| self.document.contains(id));
    }

    /// Create an element at the canvas center, above all others, and select it.
    pub fn create_element(&mut self, kind: ElementType) -> ElementId {
        let id = self.allocate_id(kind);
        let at = self.canvas.center();
        let z_index = zorder::next_z_index(&self.document.elements);
        let element = match kind {
            ElementType::Text => Element::text(id.clone(), at, z_index),
            ElementType::Image => Element::image(id.clone(), at, z_index),
        };
        self.document.elements.push(element);
        self.selection = Some(id.clone());
        self.touch();
        tracing::debug!("Created {kind:?} element {id} at z={z_index}");
        id
    }

    /// Merge `patch` over an existing element.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NotFound`] if the element does not exist.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> EditorResult<()> {
        let element = self
            .document
            .element_mut(id)
            .ok_or_else(|| EditorError::NotFound(format!("element {id}")))?;
        element.apply(patch);
        self.touch();
        Ok(())
    }

    /// Remove an element. Missing ids are a no-op that leaves `updated_at`
    /// untouched.
    ///
    /// Returns whether an element was removed.
    pub fn delete_element(&mut self, id: &ElementId) -> bool {
        let before = self.document.elements.len();
        self.document.elements.retain(|e| &e.id != id);
        if self.document.elements.len() == before {
            return false;
        }
        if self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        self.touch();
        tracing::debug!("Deleted element {id}");
        true
    }

    /// Replace the background image (empty string removes it).
    pub fn set_background(&mut self, image: impl Into<String>) {
        self.document.background_image = image.into();
        self.touch();
    }

    /// Replace the page border. Negative widths and radii are clamped to zero.
    pub fn set_page_border(&mut self, mut border: PageBorder) {
        border.width = border.width.max(0.0);
        border.radius = border.radius.max(0.0);
        self.document.page_border = border;
        self.touch();
    }

    /// Rename the document.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.document.name = name.into();
        self.touch();
    }

    /// Move an element above all others. See [`zorder::send_forward`].
    pub fn send_forward(&mut self, id: &ElementId) -> bool {
        let changed = zorder::send_forward(&mut self.document.elements, id);
        self.touch_if(changed)
    }

    /// Move an element one step down. See [`zorder::send_backward`].
    pub fn send_backward(&mut self, id: &ElementId) -> bool {
        let changed = zorder::send_backward(&mut self.document.elements, id);
        self.touch_if(changed)
    }

    /// Move an element below all others.
    pub fn send_to_back(&mut self, id: &ElementId) -> bool {
        let changed = zorder::send_to_back(&mut self.document.elements, id);
        self.touch_if(changed)
    }

    /// Move an element above all others.
    pub fn send_to_front(&mut self, id: &ElementId) -> bool {
        let changed = zorder::send_to_front(&mut self.document.elements, id);
        self.touch_if(changed)
    }

    /// Elements in paint order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Element> {
        zorder::paint_order(&self.document.elements)
    }

    /// Point-in-time copy of the document. Later edits never affect it.
    #[must_use]
    pub fn snapshot(&self) -> Document {
        self.document.clone()
    }

    /// Replace the whole document (after a load) and clear the selection.
    ///
    /// The incoming document is normalised: out-of-range sizes and borders
    /// are clamped and repeated element ids get fresh ones, so every element
    /// stays addressable.
    pub fn hydrate(&mut self, mut document: Document) {
        tracing::debug!(
            "Hydrating document {:?} with {} elements",
            document.id,
            document.elements.len()
        );
        document.normalize();
        self.document = document;
        self.selection = None;
        self.reissue_duplicate_ids();
    }

    fn reissue_duplicate_ids(&mut self) {
        let mut seen = HashSet::new();
        for index in 0..self.document.elements.len() {
            let id = self.document.elements[index].id.clone();
            if seen.insert(id.clone()) {
                continue;
            }
            let kind = self.document.elements[index].element_type();
            let fresh = self.allocate_id(kind);
            tracing::warn!("Duplicate element id {id} in loaded document, renamed to {fresh}");
            seen.insert(fresh.clone());
            self.document.elements[index].id = fresh;
        }
    }

    fn allocate_id(&mut self, kind: ElementType) -> ElementId {
        loop {
            let candidate = ElementId::new(format!("{}-{}", kind.id_prefix(), self.next_seq));
            self.next_seq += 1;
            if !self.document.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn touch_if(&mut self, changed: bool) -> bool {
        if changed {
            self.touch();
        }
        changed
    }

    /// Every successful mutation gets a strictly newer timestamp.
    fn touch(&mut self) {
        let now = current_timestamp_ms();
        self.document.updated_at = now.max(self.document.updated_at.saturating_add(1));
    }
}

/// Get the current Unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}
