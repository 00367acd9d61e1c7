//! Certificate elements - the building blocks of a document.

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp_min, Point};

/// Smallest accepted font size, width or height.
pub const MIN_EXTENT: f32 = 1.0;

/// Default font size for new text elements.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Default edge length for new image elements.
pub const DEFAULT_IMAGE_SIZE: f32 = 150.0;

/// Placeholder content of a freshly created text element.
pub const DEFAULT_TEXT_CONTENT: &str = "Double click to edit";

/// Unique identifier for an element within a document.
///
/// Opaque: persisted documents may carry hand-written ids such as `"title"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create an id from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Which kind of element to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Text label.
    Text,
    /// Raster image.
    Image,
}

impl ElementType {
    /// Prefix used when allocating ids.
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Horizontal alignment; `Center` also makes `x` the horizontal center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned; `x` is the left edge.
    #[default]
    Left,
    /// Centered; `x` is the center anchor.
    Center,
    /// Right aligned; `x` is the left edge.
    Right,
}

impl TextAlign {
    /// CSS keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Stroke pattern of a border.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    /// Continuous line.
    #[default]
    Solid,
    /// Dashed line.
    Dashed,
    /// Dotted line.
    Dotted,
}

/// Border around an element or the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    /// Stroke color (CSS color string).
    pub color: String,
    /// Stroke width, `>= 0`.
    pub width: f32,
    /// Stroke pattern.
    pub style: BorderStyle,
    /// Corner radius, `>= 0`.
    pub radius: f32,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            color: "transparent".to_string(),
            width: 0.0,
            style: BorderStyle::Solid,
            radius: 0.0,
        }
    }
}

/// The page border is a single [`Border`] shared by the whole document.
pub type PageBorder = Border;

impl Border {
    /// Default page border of a new document.
    #[must_use]
    pub fn page_default() -> Self {
        Self {
            color: "#2c3e50".to_string(),
            width: 5.0,
            style: BorderStyle::Solid,
            radius: 10.0,
        }
    }

    /// Clamp width and radius to non-negative; non-finite values become 0.
    pub fn normalize(&mut self) {
        self.width = clamp_min(self.width, 0.0).unwrap_or(0.0);
        self.radius = clamp_min(self.radius, 0.0).unwrap_or(0.0);
    }

    /// Whether the border paints anything.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && !self.color.eq_ignore_ascii_case("transparent")
    }
}

/// Variant-specific element content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text label.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Text content.
        content: String,
        /// Font size in pixels, `> 0`.
        font_size: f32,
        /// Text color; black when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        /// Font family; a fixed fallback when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_family: Option<String>,
        /// Font weight keyword; `normal` when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_weight: Option<String>,
    },

    /// An image.
    Image {
        /// Image reference (data URI); empty until an upload completes.
        #[serde(default)]
        content: String,
        /// Width in pixels, `> 0`.
        width: f32,
        /// Height in pixels, `> 0`.
        height: f32,
    },
}

/// A positioned element on the certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Horizontal anchor in document pixels.
    pub x: f32,
    /// Top edge in document pixels.
    pub y: f32,
    /// Paint order key; higher paints later.
    pub z_index: i32,
    /// Horizontal alignment.
    #[serde(default)]
    pub text_align: TextAlign,
    /// Element border.
    #[serde(default)]
    pub border: Border,
    /// Element content.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create a text element with editor defaults.
    #[must_use]
    pub fn text(id: ElementId, at: Point, z_index: i32) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            z_index,
            text_align: TextAlign::Center,
            border: Border::default(),
            kind: ElementKind::Text {
                content: DEFAULT_TEXT_CONTENT.to_string(),
                font_size: DEFAULT_FONT_SIZE,
                color: Some("#000000".to_string()),
                font_family: Some("Arial".to_string()),
                font_weight: None,
            },
        }
    }

    /// Create an empty image element with editor defaults.
    #[must_use]
    pub fn image(id: ElementId, at: Point, z_index: i32) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            z_index,
            text_align: TextAlign::Left,
            border: Border::default(),
            kind: ElementKind::Image {
                content: String::new(),
                width: DEFAULT_IMAGE_SIZE,
                height: DEFAULT_IMAGE_SIZE,
            },
        }
    }

    /// Which variant this element is.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self.kind {
            ElementKind::Text { .. } => ElementType::Text,
            ElementKind::Image { .. } => ElementType::Image,
        }
    }

    /// Stored position.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Text content or image reference.
    #[must_use]
    pub fn content(&self) -> &str {
        match &self.kind {
            ElementKind::Text { content, .. } | ElementKind::Image { content, .. } => content,
        }
    }

    /// Whether `x` is a center anchor.
    #[must_use]
    pub fn is_centered(&self) -> bool {
        self.text_align == TextAlign::Center
    }

    /// Bring values from outside the editor (a loaded file, a request body)
    /// into range: the same bounds [`apply`](Self::apply) enforces.
    /// Non-finite numbers fall back to 0 for coordinates and to the editor
    /// default for sizes.
    pub fn normalize(&mut self) {
        if !self.x.is_finite() {
            self.x = 0.0;
        }
        if !self.y.is_finite() {
            self.y = 0.0;
        }
        self.border.normalize();
        match &mut self.kind {
            ElementKind::Text { font_size, .. } => {
                *font_size = clamp_min(*font_size, MIN_EXTENT).unwrap_or(DEFAULT_FONT_SIZE);
            }
            ElementKind::Image { width, height, .. } => {
                *width = clamp_min(*width, MIN_EXTENT).unwrap_or(DEFAULT_IMAGE_SIZE);
                *height = clamp_min(*height, MIN_EXTENT).unwrap_or(DEFAULT_IMAGE_SIZE);
            }
        }
    }

    /// Apply a partial update. Fields that do not exist on this variant are
    /// ignored; out-of-range numbers are clamped.
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(x) = patch.x.filter(|v| v.is_finite()) {
            self.x = x;
        }
        if let Some(y) = patch.y.filter(|v| v.is_finite()) {
            self.y = y;
        }
        if let Some(z) = patch.z_index {
            self.z_index = z;
        }
        if let Some(align) = patch.text_align {
            self.text_align = align;
        }
        if let Some(color) = &patch.border_color {
            self.border.color.clone_from(color);
        }
        if let Some(width) = patch.border_width.and_then(|w| clamp_min(w, 0.0)) {
            self.border.width = width;
        }
        if let Some(style) = patch.border_style {
            self.border.style = style;
        }
        if let Some(radius) = patch.border_radius.and_then(|r| clamp_min(r, 0.0)) {
            self.border.radius = radius;
        }

        match &mut self.kind {
            ElementKind::Text {
                content,
                font_size,
                color,
                font_family,
                font_weight,
            } => {
                if let Some(new_content) = &patch.content {
                    content.clone_from(new_content);
                }
                if let Some(size) = patch.font_size.and_then(|s| clamp_min(s, MIN_EXTENT)) {
                    *font_size = size;
                }
                if patch.color.is_some() {
                    color.clone_from(&patch.color);
                }
                if patch.font_family.is_some() {
                    font_family.clone_from(&patch.font_family);
                }
                if patch.font_weight.is_some() {
                    font_weight.clone_from(&patch.font_weight);
                }
                if patch.width.is_some() || patch.height.is_some() {
                    tracing::debug!("Ignoring image dimensions on text element {}", self.id);
                }
            }
            ElementKind::Image {
                content,
                width,
                height,
            } => {
                if let Some(new_content) = &patch.content {
                    content.clone_from(new_content);
                }
                if let Some(w) = patch.width.and_then(|w| clamp_min(w, MIN_EXTENT)) {
                    *width = w;
                }
                if let Some(h) = patch.height.and_then(|h| clamp_min(h, MIN_EXTENT)) {
                    *height = h;
                }
            }
        }
    }
}

/// A partial set of element attributes; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct ElementPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z_index: Option<i32>,
    pub text_align: Option<TextAlign>,
    pub border_color: Option<String>,
    pub border_width: Option<f32>,
    pub border_style: Option<BorderStyle>,
    pub border_radius: Option<f32>,
    pub content: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<String>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl ElementPatch {
    /// Patch that moves an element.
    #[must_use]
    pub fn position(p: Point) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            ..Self::default()
        }
    }

    /// Patch that replaces the content.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Patch that sets the paint order key.
    #[must_use]
    pub fn z_index(z: i32) -> Self {
        Self {
            z_index: Some(z),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_defaults() {
        let el = Element::text(ElementId::new("text-1"), Point::new(400.0, 300.0), 1);
        assert_eq!(el.element_type(), ElementType::Text);
        assert!(el.is_centered());
        assert_eq!(el.content(), DEFAULT_TEXT_CONTENT);
        assert!(!el.border.is_visible());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut el = Element::text(ElementId::new("t"), Point::new(10.0, 20.0), 3);
        el.apply(&ElementPatch {
            y: Some(55.0),
            font_size: Some(40.0),
            ..ElementPatch::default()
        });
        assert!((el.x - 10.0).abs() < f32::EPSILON);
        assert!((el.y - 55.0).abs() < f32::EPSILON);
        assert_eq!(el.z_index, 3);
        match el.kind {
            ElementKind::Text { font_size, ref color, .. } => {
                assert!((font_size - 40.0).abs() < f32::EPSILON);
                assert_eq!(color.as_deref(), Some("#000000"));
            }
            ElementKind::Image { .. } => panic!("expected text"),
        }
    }

    #[test]
    fn test_patch_clamps_ranges() {
        let mut el = Element::image(ElementId::new("i"), Point::ZERO, 1);
        el.apply(&ElementPatch {
            width: Some(-20.0),
            height: Some(f32::NAN),
            border_width: Some(-1.0),
            ..ElementPatch::default()
        });
        match el.kind {
            ElementKind::Image { width, height, .. } => {
                assert!((width - MIN_EXTENT).abs() < f32::EPSILON);
                assert!((height - DEFAULT_IMAGE_SIZE).abs() < f32::EPSILON);
            }
            ElementKind::Text { .. } => panic!("expected image"),
        }
        assert!(el.border.width.abs() < f32::EPSILON);
    }

    #[test]
    fn test_patch_ignores_fields_of_other_variant() {
        let mut el = Element::image(ElementId::new("i"), Point::ZERO, 1);
        let before = el.clone();
        el.apply(&ElementPatch {
            font_size: Some(30.0),
            color: Some("#ff0000".to_string()),
            ..ElementPatch::default()
        });
        assert_eq!(el, before);
    }

    #[test]
    fn test_wire_format() {
        let el = Element::image(ElementId::new("image-1"), Point::new(5.0, 6.0), 2);
        let json = serde_json::to_value(&el).expect("serialize");
        assert_eq!(json["type"], "image");
        assert_eq!(json["zIndex"], 2);
        assert_eq!(json["textAlign"], "left");
        assert_eq!(json["border"]["style"], "solid");

        let back: Element = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, el);
    }

    #[test]
    fn test_deserialize_minimal_text() {
        let json = r#"{"id":"title","type":"text","content":"Hi","x":400,"y":100,"zIndex":1,"fontSize":36}"#;
        let el: Element = serde_json::from_str(json).expect("deserialize");
        assert_eq!(el.id.as_str(), "title");
        assert_eq!(el.text_align, TextAlign::Left);
        assert_eq!(el.border, Border::default());
    }
}
