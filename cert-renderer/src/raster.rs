//! SVG rasterization with resvg and tiny-skia.

use std::sync::Arc;

use cert_core::{Bitmap, EditorResult, Layout, Rasterizer};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::svg::layout_to_svg;

/// Configuration for rasterization and page encoding.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    /// Output pixels per document pixel (default: 2.0).
    pub scale: f32,
    /// DPI used to size printed pages (default: 96.0).
    pub dpi: f32,
    /// Background color as RGBA bytes (default: opaque white).
    pub background: [u8; 4],
    /// Load the system font database so text renders (default: true).
    pub load_system_fonts: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            dpi: 96.0,
            background: [255, 255, 255, 255],
            load_system_fonts: true,
        }
    }
}

/// [`Rasterizer`] that renders a layout through an SVG intermediate.
pub struct SvgRasterizer {
    config: ExportConfig,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SvgRasterizer {
    /// Create a rasterizer. Loading system fonts is done once, here.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        if config.load_system_fonts {
            fontdb.load_system_fonts();
            tracing::debug!("Loaded {} font faces", fontdb.len());
        }
        Self {
            config,
            fontdb: Arc::new(fontdb),
        }
    }

    /// Rasterizer with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Render `layout` to a tiny-skia pixmap.
    ///
    /// # Errors
    ///
    /// Returns an error if the SVG cannot be parsed or the pixmap cannot be
    /// allocated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_pixmap(&self, layout: &Layout) -> RenderResult<tiny_skia::Pixmap> {
        let svg = layout_to_svg(layout, self.config.scale, self.config.background);
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| RenderError::Svg(e.to_string()))?;

        let px_w = tree.size().width() as u32;
        let px_h = tree.size().height() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Raster(format!("cannot allocate {px_w}x{px_h} pixmap")))?;

        // The root viewBox already maps document pixels to output pixels.
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, layout: &Layout) -> EditorResult<Bitmap> {
        let pixmap = self.render_pixmap(layout)?;
        Ok(pixmap_to_bitmap(&pixmap))
    }
}

/// Copy a premultiplied pixmap into a straight-alpha RGBA bitmap.
fn pixmap_to_bitmap(pixmap: &tiny_skia::Pixmap) -> Bitmap {
    let mut pixels = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Bitmap {
        width: pixmap.width(),
        height: pixmap.height(),
        pixels,
    }
}
