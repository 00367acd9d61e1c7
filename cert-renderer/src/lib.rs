//! # Certificate Studio Renderer
//!
//! Rendering collaborators for the export pipeline and image uploads.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ Document │──►│ compose      │──►│ SvgRasterizer │──►│ PngEncoder / │
//! │ snapshot │   │ (cert-core)  │   │ usvg + resvg  │   │ PdfEncoder   │
//! └──────────┘   └──────────────┘   └───────────────┘   └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod encode;
pub mod error;
pub mod raster;
pub mod svg;
pub mod upload;

use std::sync::Arc;

use cert_core::{
    Artifact, Document, EditorResult, ExportPipeline, PageEncoder, Rasterizer, TextMetrics,
};

pub use encode::{PdfEncoder, PngEncoder};
pub use error::{RenderError, RenderResult};
pub use raster::{ExportConfig, SvgRasterizer};
pub use upload::{decode_in_background, RasterImageDecoder};

/// Pipeline producing PNG images.
pub type PngPipeline = ExportPipeline<SvgRasterizer, PngEncoder>;

/// Pipeline producing single-page PDFs.
pub type PdfPipeline = ExportPipeline<SvgRasterizer, PdfEncoder>;

/// PNG export pipeline for the default canvas.
#[must_use]
pub fn png_pipeline(config: ExportConfig) -> PngPipeline {
    ExportPipeline::new(SvgRasterizer::new(config), PngEncoder)
}

/// PDF export pipeline for the default canvas; pages use the config's DPI.
#[must_use]
pub fn pdf_pipeline(config: ExportConfig) -> PdfPipeline {
    let encoder = PdfEncoder {
        dpi: config.dpi,
        ..PdfEncoder::default()
    };
    ExportPipeline::new(SvgRasterizer::new(config), encoder)
}

/// Export an owned snapshot on the blocking pool.
///
/// The snapshot is taken by value, so edits made while the export runs never
/// reach the artifact.
///
/// # Errors
///
/// Returns [`cert_core::EditorError::Export`] if rendering, encoding or the
/// task itself fails.
pub async fn export_in_background<R, E, M>(
    pipeline: Arc<ExportPipeline<R, E, M>>,
    snapshot: Document,
) -> EditorResult<Artifact>
where
    R: Rasterizer + Send + Sync + 'static,
    E: PageEncoder + Send + Sync + 'static,
    M: TextMetrics + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || pipeline.export(&snapshot))
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?
}

/// Renderer library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
