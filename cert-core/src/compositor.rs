//! Export compositor: turns a document snapshot into a deterministic layout.
//!
//! The layout is the contract between the live canvas and any rasterizer:
//! resolved absolute boxes in paint order, with every optional style
//! substituted. The same snapshot and canvas always produce the same layout,
//! byte for byte once serialized.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::element::{Border, Element, ElementId, ElementKind, PageBorder, TextAlign};
use crate::event::{Hit, HitRegion};
use crate::geometry::{anchored_left, clamp_axis, CanvasSize, Point, Rect};
use crate::zorder;

/// Font family used when an element does not set one.
pub const FALLBACK_FONT_FAMILY: &str = "Arial";

/// Text color used when an element does not set one.
pub const FALLBACK_TEXT_COLOR: &str = "#000000";

/// Font weight used when an element does not set one.
pub const FALLBACK_FONT_WEIGHT: &str = "normal";

/// Measures rendered text. Text elements size to their content, so the
/// compositor needs a measurement to place centered text.
pub trait TextMetrics {
    /// Width and height of a single line of `text`.
    fn measure(&self, text: &str, font_size: f32, font_family: &str, font_weight: &str) -> (f32, f32);
}

/// Font-agnostic estimate: fixed advance per character and fixed line height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateMetrics {
    /// Average glyph advance in ems.
    pub advance_em: f32,
    /// Extra advance in ems for bold text.
    pub bold_extra_em: f32,
    /// Line height in ems.
    pub line_height_em: f32,
}

impl Default for ApproximateMetrics {
    fn default() -> Self {
        Self {
            advance_em: 0.6,
            bold_extra_em: 0.05,
            line_height_em: 1.2,
        }
    }
}

impl TextMetrics for ApproximateMetrics {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str, font_size: f32, _font_family: &str, font_weight: &str) -> (f32, f32) {
        let advance = if font_weight == "bold" {
            self.advance_em + self.bold_extra_em
        } else {
            self.advance_em
        };
        let chars = text.chars().count() as f32;
        (chars * advance * font_size, self.line_height_em * font_size)
    }
}

/// Fully resolved paint attributes of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Paint {
    /// Draw text.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Text content.
        content: String,
        /// Font size in pixels.
        font_size: f32,
        /// Fill color.
        color: String,
        /// Font family.
        font_family: String,
        /// Font weight keyword.
        font_weight: String,
        /// Alignment within the box.
        text_align: TextAlign,
    },
    /// Draw an image scaled to fit (contain) its box.
    Image {
        /// Image reference; empty draws only the border.
        source: String,
    },
}

/// One element, ready for a rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawInstruction {
    /// Source element.
    pub element: ElementId,
    /// Paint order key it was sorted by.
    pub z_index: i32,
    /// Absolute box on the page.
    pub bounds: Rect,
    /// Element border.
    pub border: Border,
    /// What to paint inside the box.
    pub paint: Paint,
}

/// Ordered draw instructions for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Page size.
    pub canvas: CanvasSize,
    /// Background image covering the page, if any.
    pub background: Option<String>,
    /// Border around the page.
    pub page_border: PageBorder,
    /// Draw instructions, bottom first.
    pub instructions: Vec<DrawInstruction>,
}

impl Layout {
    /// Topmost element whose box contains `point` (document coordinates).
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<Hit> {
        self.instructions
            .iter()
            .rev()
            .find(|instr| instr.bounds.contains(point))
            .map(|instr| Hit {
                element: instr.element.clone(),
                bounds: instr.bounds,
                region: HitRegion::Container,
            })
    }

    /// Canonical serialized form, used to compare layouts.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_bytes(&self) -> crate::EditorResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Build the layout for `document` on `canvas`.
///
/// Reads only its inputs: no clock, no randomness, no unordered traversal.
#[must_use]
pub fn compose(document: &Document, canvas: CanvasSize, metrics: &dyn TextMetrics) -> Layout {
    // Elements sit inside the bordered page.
    let inset = document.page_border.width.max(0.0);

    let instructions = zorder::paint_order(&document.elements)
        .into_iter()
        .map(|element| draw_instruction(element, canvas, inset, metrics))
        .collect();

    Layout {
        canvas,
        background: (!document.background_image.is_empty())
            .then(|| document.background_image.clone()),
        page_border: document.page_border.clone(),
        instructions,
    }
}

fn draw_instruction(element: &Element, canvas: CanvasSize, inset: f32, metrics: &dyn TextMetrics) -> DrawInstruction {
    let (width, height, paint) = match &element.kind {
        ElementKind::Text {
            content,
            font_size,
            color,
            font_family,
            font_weight,
        } => {
            let font_family = font_family
                .clone()
                .unwrap_or_else(|| FALLBACK_FONT_FAMILY.to_string());
            let font_weight = font_weight
                .clone()
                .unwrap_or_else(|| FALLBACK_FONT_WEIGHT.to_string());
            let (w, h) = metrics.measure(content, *font_size, &font_family, &font_weight);
            let paint = Paint::Text {
                content: content.clone(),
                font_size: *font_size,
                color: color
                    .clone()
                    .unwrap_or_else(|| FALLBACK_TEXT_COLOR.to_string()),
                font_family,
                font_weight,
                text_align: element.text_align,
            };
            (w, h, paint)
        }
        ElementKind::Image {
            content,
            width,
            height,
        } => (
            *width,
            *height,
            Paint::Image {
                source: content.clone(),
            },
        ),
    };

    let x = clamp_axis(element.x, canvas.width);
    let y = clamp_axis(element.y, canvas.height);

    DrawInstruction {
        element: element.id.clone(),
        z_index: element.z_index,
        bounds: Rect::new(
            inset + anchored_left(x, width, element.is_centered()),
            inset + y,
            width,
            height,
        ),
        border: element.border.clone(),
        paint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementPatch, ElementType};
    use crate::store::DocumentStore;

    fn borderless(store: &mut DocumentStore) {
        store.set_page_border(PageBorder {
            width: 0.0,
            ..PageBorder::page_default()
        });
    }

    #[test]
    fn test_centered_element_translated_by_half_width() {
        let mut store = DocumentStore::new();
        borderless(&mut store);
        let id = store.create_element(ElementType::Image);
        store
            .update_element(
                &id,
                &ElementPatch {
                    text_align: Some(TextAlign::Center),
                    width: Some(200.0),
                    ..ElementPatch::default()
                },
            )
            .expect("update");

        let layout = compose(store.document(), store.canvas(), &ApproximateMetrics::default());
        let bounds = layout.instructions[0].bounds;
        assert!((bounds.x - 300.0).abs() < f32::EPSILON);
        assert!((bounds.y - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_page_border_insets_elements() {
        let mut store = DocumentStore::new();
        let id = store.create_element(ElementType::Image);
        store
            .update_element(&id, &ElementPatch::position(Point::new(10.0, 20.0)))
            .expect("update");

        let layout = compose(store.document(), store.canvas(), &ApproximateMetrics::default());
        assert_eq!(layout.instructions[0].bounds.origin(), Point::new(15.0, 25.0));
    }

    #[test]
    fn test_out_of_bounds_positions_clamped_at_read_time() {
        let mut store = DocumentStore::new();
        borderless(&mut store);
        let id = store.create_element(ElementType::Image);
        store
            .update_element(&id, &ElementPatch::position(Point::new(-50.0, 1200.0)))
            .expect("update");

        let layout = compose(store.document(), store.canvas(), &ApproximateMetrics::default());
        assert_eq!(layout.instructions[0].bounds.origin(), Point::new(0.0, 600.0));
        // The store itself is not modified.
        assert_eq!(
            store.element(&id).map(Element::position),
            Some(Point::new(-50.0, 1200.0))
        );
    }

    #[test]
    fn test_defaults_substituted() {
        let mut store = DocumentStore::new();
        let id = store.create_element(ElementType::Text);
        let mut doc = store.snapshot();
        if let Some(ElementKind::Text {
            color,
            font_family,
            ..
        }) = doc.element_mut(&id).map(|e| &mut e.kind)
        {
            *color = None;
            *font_family = None;
        }

        let layout = compose(&doc, store.canvas(), &ApproximateMetrics::default());
        match &layout.instructions[0].paint {
            Paint::Text {
                color,
                font_family,
                font_weight,
                ..
            } => {
                assert_eq!(color, FALLBACK_TEXT_COLOR);
                assert_eq!(font_family, FALLBACK_FONT_FAMILY);
                assert_eq!(font_weight, FALLBACK_FONT_WEIGHT);
            }
            Paint::Image { .. } => panic!("expected text"),
        }
    }

    #[test]
    fn test_instructions_follow_paint_order() {
        let mut store = DocumentStore::new();
        let a = store.create_element(ElementType::Text);
        let b = store.create_element(ElementType::Image);
        let c = store.create_element(ElementType::Text);
        store.send_to_back(&c);

        let layout = compose(store.document(), store.canvas(), &ApproximateMetrics::default());
        let order: Vec<_> = layout.instructions.iter().map(|i| i.element.clone()).collect();
        assert_eq!(order, vec![c, a, b]);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let mut store = DocumentStore::new();
        for _ in 0..5 {
            store.create_element(ElementType::Text);
            store.create_element(ElementType::Image);
        }
        store.set_background("data:image/png;base64,AAAA");
        let snapshot = store.snapshot();

        let first = compose(&snapshot, store.canvas(), &ApproximateMetrics::default())
            .to_json_bytes()
            .expect("json");
        let second = compose(&snapshot, store.canvas(), &ApproximateMetrics::default())
            .to_json_bytes()
            .expect("json");
        assert_eq!(first, second);
    }

    #[test]
    fn test_hit_test_returns_topmost() {
        let mut store = DocumentStore::new();
        borderless(&mut store);
        let below = store.create_element(ElementType::Image);
        let above = store.create_element(ElementType::Image);

        let layout = compose(store.document(), store.canvas(), &ApproximateMetrics::default());
        let hit = layout.hit_test(Point::new(450.0, 350.0)).expect("hit");
        assert_eq!(hit.element, above);

        store.send_to_front(&below);
        let layout = compose(store.document(), store.canvas(), &ApproximateMetrics::default());
        let hit = layout.hit_test(Point::new(450.0, 350.0)).expect("hit");
        assert_eq!(hit.element, below);

        assert!(layout.hit_test(Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_empty_background_is_none() {
        let store = DocumentStore::new();
        let layout = compose(store.document(), store.canvas(), &ApproximateMetrics::default());
        assert!(layout.background.is_none());
        assert!(layout.instructions.is_empty());
    }
}
