//! Export pipeline: compose, rasterize, encode.
//!
//! The pipeline reads a document snapshot and never touches the store, so an
//! export started before further edits reflects the document as it was.

use serde::{Deserialize, Serialize};

use crate::compositor::{compose, ApproximateMetrics, Layout, TextMetrics};
use crate::document::Document;
use crate::geometry::CanvasSize;
use crate::EditorResult;

/// An RGBA8 bitmap, row-major, not premultiplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Whether `pixels` has the length the dimensions require.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        u64::from(self.width) * u64::from(self.height) * 4 == self.pixels.len() as u64
    }
}

/// Output page size in document pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page width.
    pub width: f32,
    /// Page height.
    pub height: f32,
}

impl From<CanvasSize> for PageSize {
    fn from(canvas: CanvasSize) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
        }
    }
}

/// Encoded artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// Single-page PDF.
    Pdf,
}

impl ExportFormat {
    /// MIME type.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }
}

/// Result of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Encoding of `bytes`.
    pub format: ExportFormat,
    /// Suggested download name.
    pub file_name: String,
    /// Encoded file.
    pub bytes: Vec<u8>,
}

/// Renders a layout to pixels.
pub trait Rasterizer {
    /// Rasterize `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::Export`] if rendering fails.
    fn rasterize(&self, layout: &Layout) -> EditorResult<Bitmap>;
}

/// Encodes a bitmap as a file.
pub trait PageEncoder {
    /// Format this encoder produces.
    fn format(&self) -> ExportFormat;

    /// Encode `bitmap` as one page of `page` size.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::Export`] if encoding fails.
    fn encode_page(&self, bitmap: &Bitmap, page: PageSize) -> EditorResult<Vec<u8>>;
}

/// Compose → rasterize → encode.
#[derive(Debug, Clone)]
pub struct ExportPipeline<R, E, M = ApproximateMetrics> {
    rasterizer: R,
    encoder: E,
    metrics: M,
    canvas: CanvasSize,
}

impl<R: Rasterizer, E: PageEncoder> ExportPipeline<R, E> {
    /// Create a pipeline for the default canvas with approximate text metrics.
    #[must_use]
    pub fn new(rasterizer: R, encoder: E) -> Self {
        Self {
            rasterizer,
            encoder,
            metrics: ApproximateMetrics::default(),
            canvas: CanvasSize::default(),
        }
    }
}

impl<R: Rasterizer, E: PageEncoder, M: TextMetrics> ExportPipeline<R, E, M> {
    /// Use a different canvas size.
    #[must_use]
    pub fn with_canvas(mut self, canvas: CanvasSize) -> Self {
        self.canvas = canvas;
        self
    }

    /// Use different text metrics.
    #[must_use]
    pub fn with_metrics<N: TextMetrics>(self, metrics: N) -> ExportPipeline<R, E, N> {
        ExportPipeline {
            rasterizer: self.rasterizer,
            encoder: self.encoder,
            metrics,
            canvas: self.canvas,
        }
    }

    /// Layout the pipeline would rasterize for `document`.
    #[must_use]
    pub fn layout(&self, document: &Document) -> Layout {
        compose(document, self.canvas, &self.metrics)
    }

    /// Export `document`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::Export`] if the rasterizer or encoder
    /// fails. The caller's state is unaffected either way.
    pub fn export(&self, document: &Document) -> EditorResult<Artifact> {
        let layout = self.layout(document);
        tracing::debug!(
            "Exporting {:?} with {} draw instructions",
            document.name,
            layout.instructions.len()
        );

        let bitmap = self.rasterizer.rasterize(&layout)?;
        let format = self.encoder.format();
        let bytes = self.encoder.encode_page(&bitmap, self.canvas.into())?;

        Ok(Artifact {
            format,
            file_name: format!("{}.{}", file_stem(&document.name), format.extension()),
            bytes,
        })
    }
}

/// Fallback download name for documents without a usable name.
pub const DEFAULT_FILE_STEM: &str = "certificate";

/// Download name stem for a document called `name`.
///
/// Path separators, characters reserved on common filesystems and control
/// characters become `_`; surrounding whitespace and dots are dropped. Falls
/// back to [`DEFAULT_FILE_STEM`] when nothing is left.
#[must_use]
pub fn file_stem(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c: char| c.is_whitespace() || c == '.');
    if trimmed.is_empty() {
        DEFAULT_FILE_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::store::DocumentStore;
    use crate::EditorError;
    use std::cell::RefCell;

    /// Records the layout it was given and returns a 1x1 bitmap.
    #[derive(Default)]
    struct RecordingRasterizer {
        seen: RefCell<Vec<Layout>>,
    }

    impl Rasterizer for RecordingRasterizer {
        fn rasterize(&self, layout: &Layout) -> EditorResult<Bitmap> {
            self.seen.borrow_mut().push(layout.clone());
            Ok(Bitmap {
                width: 1,
                height: 1,
                pixels: vec![255; 4],
            })
        }
    }

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(&self, _layout: &Layout) -> EditorResult<Bitmap> {
            Err(EditorError::Export("no renderer".to_string()))
        }
    }

    struct RawEncoder;

    impl PageEncoder for RawEncoder {
        fn format(&self) -> ExportFormat {
            ExportFormat::Png
        }

        fn encode_page(&self, bitmap: &Bitmap, _page: PageSize) -> EditorResult<Vec<u8>> {
            Ok(bitmap.pixels.clone())
        }
    }

    #[test]
    fn test_export_runs_all_stages() {
        let mut store = DocumentStore::new();
        store.create_element(ElementType::Text);
        let pipeline = ExportPipeline::new(RecordingRasterizer::default(), RawEncoder);

        let artifact = pipeline.export(&store.snapshot()).expect("export");
        assert_eq!(artifact.format, ExportFormat::Png);
        assert_eq!(artifact.file_name, "New Certificate.png");
        assert_eq!(artifact.bytes, vec![255; 4]);
        assert_eq!(pipeline.rasterizer.seen.borrow()[0].instructions.len(), 1);
    }

    #[test]
    fn test_artifact_named_after_document() {
        let pipeline = ExportPipeline::new(RecordingRasterizer::default(), RawEncoder);

        let mut doc = Document::new("Jane Doe - Honors", 0);
        let artifact = pipeline.export(&doc).expect("export");
        assert_eq!(artifact.file_name, "Jane Doe - Honors.png");

        doc.name = "   ".to_string();
        let artifact = pipeline.export(&doc).expect("export");
        assert_eq!(artifact.file_name, "certificate.png");
    }

    #[test]
    fn test_file_stem_strips_unsafe_characters() {
        assert_eq!(file_stem("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(file_stem("Q1: Awards?"), "Q1_ Awards_");
        assert_eq!(file_stem("Jane's certificate"), "Jane's certificate");
        assert_eq!(file_stem(" .. "), DEFAULT_FILE_STEM);
        assert_eq!(file_stem(""), DEFAULT_FILE_STEM);
    }

    #[test]
    fn test_export_failure_surfaces() {
        let store = DocumentStore::new();
        let before = store.snapshot();
        let pipeline = ExportPipeline::new(FailingRasterizer, RawEncoder);

        let result = pipeline.export(&store.snapshot());
        assert!(matches!(result, Err(EditorError::Export(_))));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_snapshot_isolated_from_later_edits() {
        let mut store = DocumentStore::new();
        store.create_element(ElementType::Text);
        let snapshot = store.snapshot();
        store.create_element(ElementType::Image);

        let pipeline = ExportPipeline::new(RecordingRasterizer::default(), RawEncoder);
        pipeline.export(&snapshot).expect("export");
        assert_eq!(pipeline.rasterizer.seen.borrow()[0].instructions.len(), 1);
    }

    #[test]
    fn test_bitmap_well_formed() {
        let bitmap = Bitmap {
            width: 2,
            height: 2,
            pixels: vec![0; 16],
        };
        assert!(bitmap.is_well_formed());
        assert!(!Bitmap { pixels: vec![0; 3], ..bitmap }.is_well_formed());
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Pdf.mime_type(), "application/pdf");
        assert_eq!(ExportFormat::Pdf.extension(), "pdf");
    }
}
