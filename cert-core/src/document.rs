//! The certificate document: elements, background and page border.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId, PageBorder};

/// Name given to documents that have not been saved yet.
pub const NEW_DOCUMENT_NAME: &str = "New Certificate";

/// A certificate document.
///
/// `elements` is kept in insertion order; paint order is derived from
/// `z_index` (see [`crate::zorder::paint_order`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Persisted id; `None` until the first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Background image reference, empty for none.
    #[serde(default)]
    pub background_image: String,
    /// Border drawn around the page.
    #[serde(default = "PageBorder::page_default")]
    pub page_border: PageBorder,
    /// All elements, in insertion order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Creation time (Unix ms).
    #[serde(default)]
    pub created_at: u64,
    /// Last mutation time (Unix ms).
    #[serde(default)]
    pub updated_at: u64,
}

impl Document {
    /// Create an empty, unsaved document.
    #[must_use]
    pub fn new(name: impl Into<String>, now: u64) -> Self {
        Self {
            id: None,
            name: name.into(),
            background_image: String::new(),
            page_border: PageBorder::page_default(),
            elements: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up an element.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Look up an element mutably.
    pub fn element_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    /// Whether an element with this id exists.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.element(id).is_some()
    }

    /// First element id that appears more than once, if any.
    #[must_use]
    pub fn duplicate_element_id(&self) -> Option<&ElementId> {
        let mut seen = HashSet::new();
        self.elements
            .iter()
            .map(|e| &e.id)
            .find(|id| !seen.insert(*id))
    }

    /// Clamp element sizes, borders and the page border into range.
    /// Element ids are left alone.
    pub fn normalize(&mut self) {
        self.page_border.normalize();
        for element in &mut self.elements {
            element.normalize();
        }
    }

    /// Whether there is anything to export.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.elements.is_empty() && self.background_image.is_empty()
    }

    /// Summary used in document listings.
    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::EditorResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a valid document.
    pub fn from_json(json: &str) -> crate::EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A saved document as shown in the "load" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    /// Persisted id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Last mutation time (Unix ms).
    pub updated_at: u64,
}
