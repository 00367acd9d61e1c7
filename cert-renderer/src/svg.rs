//! Layout to SVG.
//!
//! The SVG is an intermediate form only: it is parsed straight back by usvg
//! for rasterization. Coordinates stay in document pixels and the root
//! `viewBox` applies the output scale.

use std::fmt::Write;

use cert_core::{Border, BorderStyle, DrawInstruction, Layout, Paint, Rect, TextAlign};

/// Render `layout` as an SVG document of `scale` times the canvas size.
///
/// `background` is the RGBA fill painted under everything.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn layout_to_svg(layout: &Layout, scale: f32, background: [u8; 4]) -> String {
    let view_w = layout.canvas.width.max(1.0);
    let view_h = layout.canvas.height.max(1.0);
    let out_w = ((view_w * scale).round() as u32).max(1);
    let out_h = ((view_h * scale).round() as u32).max(1);

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
    );

    let bg_alpha = f32::from(background[3]) / 255.0;
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"rgba({},{},{},{bg_alpha})\"/>",
        background[0], background[1], background[2],
    );

    if let Some(image) = &layout.background {
        // Background images cover the page, cropping the overflow.
        let _ = write!(
            svg,
            "<image x=\"0\" y=\"0\" width=\"{view_w}\" height=\"{view_h}\" preserveAspectRatio=\"xMidYMid slice\" href=\"{}\"/>",
            escape_xml(image),
        );
    }

    if layout.page_border.is_visible() {
        let w = layout.page_border.width;
        let page = Rect::new(w / 2.0, w / 2.0, view_w - w, view_h - w);
        write_border(&mut svg, page, &layout.page_border);
    }

    for instruction in &layout.instructions {
        write_instruction(&mut svg, instruction);
    }

    svg.push_str("</svg>");
    svg
}

fn write_instruction(svg: &mut String, instruction: &DrawInstruction) {
    let b = instruction.bounds;

    match &instruction.paint {
        Paint::Text {
            content,
            font_size,
            color,
            font_family,
            font_weight,
            text_align,
        } => {
            let (anchor, x) = match text_align {
                TextAlign::Left => ("start", b.x),
                TextAlign::Center => ("middle", b.x + b.width / 2.0),
                TextAlign::Right => ("end", b.x + b.width),
            };
            // Approximate a vertically centered line box.
            let baseline = b.y + b.height / 2.0 + font_size * 0.35;
            let _ = write!(
                svg,
                "<text x=\"{x}\" y=\"{baseline}\" font-size=\"{font_size}\" font-family=\"{}\" font-weight=\"{}\" fill=\"{}\" text-anchor=\"{anchor}\">{}</text>",
                escape_xml(font_family),
                escape_xml(font_weight),
                escape_xml(color),
                escape_xml(content),
            );
        }
        Paint::Image { source } => {
            if !source.is_empty() {
                let _ = write!(
                    svg,
                    "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid meet\" href=\"{}\"/>",
                    b.x,
                    b.y,
                    b.width,
                    b.height,
                    escape_xml(source),
                );
            }
        }
    }

    if instruction.border.is_visible() {
        // Borders sit outside the content box.
        let w = instruction.border.width;
        let outer = Rect::new(b.x - w / 2.0, b.y - w / 2.0, b.width + w, b.height + w);
        write_border(svg, outer, &instruction.border);
    }
}

/// Stroke `rect` (already centered on the stroke line) with `border`.
fn write_border(svg: &mut String, rect: Rect, border: &Border) {
    let w = border.width;
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{w}\"",
        rect.x,
        rect.y,
        rect.width.max(0.0),
        rect.height.max(0.0),
        border.radius,
        escape_xml(&border.color),
    );
    match border.style {
        BorderStyle::Solid => {}
        BorderStyle::Dashed => {
            let _ = write!(svg, " stroke-dasharray=\"{} {}\"", w * 3.0, w * 2.0);
        }
        BorderStyle::Dotted => {
            let _ = write!(
                svg,
                " stroke-dasharray=\"0 {}\" stroke-linecap=\"round\"",
                w * 2.0
            );
        }
    }
    svg.push_str("/>");
}

/// Escape special XML characters.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cert_core::{compose, ApproximateMetrics, DocumentStore, ElementPatch, ElementType, PageBorder};

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    fn layout_of(store: &DocumentStore) -> Layout {
        compose(store.document(), store.canvas(), &ApproximateMetrics::default())
    }

    #[test]
    fn test_svg_root_scaled() {
        let store = DocumentStore::new();
        let svg = layout_to_svg(&layout_of(&store), 2.0, WHITE);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"1600\""));
        assert!(svg.contains("height=\"1200\""));
        assert!(svg.contains("viewBox=\"0 0 800 600\""));
    }

    #[test]
    fn test_page_border_drawn() {
        let store = DocumentStore::new();
        let svg = layout_to_svg(&layout_of(&store), 1.0, WHITE);
        assert!(svg.contains("stroke=\"#2c3e50\""));
        assert!(svg.contains("rx=\"10\""));
    }

    #[test]
    fn test_invisible_page_border_skipped() {
        let mut store = DocumentStore::new();
        store.set_page_border(PageBorder {
            width: 0.0,
            ..PageBorder::page_default()
        });
        let svg = layout_to_svg(&layout_of(&store), 1.0, WHITE);
        assert!(!svg.contains("stroke="));
    }

    #[test]
    fn test_text_is_escaped_and_centered() {
        let mut store = DocumentStore::new();
        let id = store.create_element(ElementType::Text);
        store
            .update_element(&id, &ElementPatch::content("A < B & \"C\""))
            .expect("update");

        let svg = layout_to_svg(&layout_of(&store), 1.0, WHITE);
        assert!(svg.contains("A &lt; B &amp; &quot;C&quot;"));
        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(svg.contains("font-family=\"Arial\""));
    }

    #[test]
    fn test_empty_image_draws_nothing_but_border() {
        let mut store = DocumentStore::new();
        let id = store.create_element(ElementType::Image);
        store
            .update_element(
                &id,
                &ElementPatch {
                    border_color: Some("#ff0000".to_string()),
                    border_width: Some(2.0),
                    border_style: Some(BorderStyle::Dashed),
                    ..ElementPatch::default()
                },
            )
            .expect("update");

        let svg = layout_to_svg(&layout_of(&store), 1.0, WHITE);
        assert!(!svg.contains("<image"));
        assert!(svg.contains("stroke=\"#ff0000\""));
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
    }

    #[test]
    fn test_background_covers_page() {
        let mut store = DocumentStore::new();
        store.set_background("data:image/png;base64,AAAA");
        let svg = layout_to_svg(&layout_of(&store), 1.0, WHITE);
        assert!(svg.contains("preserveAspectRatio=\"xMidYMid slice\""));
    }

    #[test]
    fn test_paint_order_preserved_in_svg() {
        let mut store = DocumentStore::new();
        let first = store.create_element(ElementType::Text);
        store
            .update_element(&first, &ElementPatch::content("bottom"))
            .expect("update");
        let second = store.create_element(ElementType::Text);
        store
            .update_element(&second, &ElementPatch::content("top"))
            .expect("update");
        store.send_to_back(&second);

        let svg = layout_to_svg(&layout_of(&store), 1.0, WHITE);
        let top = svg.find(">top<").expect("top text");
        let bottom = svg.find(">bottom<").expect("bottom text");
        assert!(top < bottom);
    }
}
