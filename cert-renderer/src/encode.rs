//! Page encoders: PNG via the `image` crate, PDF via printpdf.

use std::io::Cursor;

use cert_core::{Bitmap, EditorResult, ExportFormat, PageEncoder, PageSize};
use image::ImageEncoder;

use crate::error::{RenderError, RenderResult};

/// Millimetres per inch.
const MM_PER_INCH: f32 = 25.4;

/// Encodes a bitmap as a PNG image. The page size is ignored: the image keeps
/// the bitmap's pixel size.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl PngEncoder {
    /// Encode `bitmap` to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bitmap is malformed or encoding fails.
    pub fn encode(bitmap: &Bitmap) -> RenderResult<Vec<u8>> {
        check(bitmap)?;
        let mut buf = Cursor::new(Vec::new());
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(
                &bitmap.pixels,
                bitmap.width,
                bitmap.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;
        Ok(buf.into_inner())
    }
}

impl PageEncoder for PngEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Png
    }

    fn encode_page(&self, bitmap: &Bitmap, _page: PageSize) -> EditorResult<Vec<u8>> {
        Ok(Self::encode(bitmap)?)
    }
}

/// Encodes a bitmap as a single-page PDF sized to the page, with the bitmap
/// filling the page.
#[derive(Debug, Clone)]
pub struct PdfEncoder {
    /// Pixels per inch used to convert page pixels to millimetres.
    pub dpi: f32,
    /// Document title.
    pub title: String,
}

impl Default for PdfEncoder {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            title: "Certificate".to_string(),
        }
    }
}

impl PdfEncoder {
    /// Page size in millimetres for a page of `page` pixels.
    #[must_use]
    pub fn page_mm(&self, page: PageSize) -> (f32, f32) {
        (
            page.width / self.dpi * MM_PER_INCH,
            page.height / self.dpi * MM_PER_INCH,
        )
    }

    /// Encode `bitmap` as one PDF page.
    ///
    /// # Errors
    ///
    /// Returns an error if the bitmap is malformed or the PDF cannot be
    /// written.
    #[allow(clippy::cast_precision_loss)]
    pub fn encode(&self, bitmap: &Bitmap, page: PageSize) -> RenderResult<Vec<u8>> {
        check(bitmap)?;
        let (page_width_mm, page_height_mm) = self.page_mm(page);

        let (doc, page1, layer1) = printpdf::PdfDocument::new(
            &self.title,
            printpdf::Mm(page_width_mm),
            printpdf::Mm(page_height_mm),
            "Layer 1",
        );
        let current_layer = doc.get_page(page1).get_layer(layer1);

        // Build the image with printpdf's bundled image crate; PDF images
        // carry no alpha, so flatten to RGB.
        let rgba = printpdf::image_crate::RgbaImage::from_raw(
            bitmap.width,
            bitmap.height,
            bitmap.pixels.clone(),
        )
        .ok_or_else(|| RenderError::Encode("bitmap does not match its size".to_string()))?;
        let rgb = printpdf::image_crate::DynamicImage::ImageRgba8(rgba).to_rgb8();
        let pdf_image =
            printpdf::Image::from_dynamic_image(&printpdf::image_crate::DynamicImage::ImageRgb8(rgb));

        // At `dpi` the bitmap is `scale` times the page; shrink it to fit.
        let scale_x = page.width / bitmap.width as f32;
        let scale_y = page.height / bitmap.height as f32;
        let transform = printpdf::ImageTransform {
            translate_x: Some(printpdf::Mm(0.0)),
            translate_y: Some(printpdf::Mm(0.0)),
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
            dpi: Some(self.dpi),
            ..Default::default()
        };
        pdf_image.add_to_layer(current_layer, transform);

        doc.save_to_bytes()
            .map_err(|e| RenderError::Encode(format!("PDF save failed: {e}")))
    }
}

impl PageEncoder for PdfEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn encode_page(&self, bitmap: &Bitmap, page: PageSize) -> EditorResult<Vec<u8>> {
        Ok(self.encode(bitmap, page)?)
    }
}

fn check(bitmap: &Bitmap) -> RenderResult<()> {
    if bitmap.width == 0 || bitmap.height == 0 || !bitmap.is_well_formed() {
        return Err(RenderError::Encode(format!(
            "malformed {}x{} bitmap with {} bytes",
            bitmap.width,
            bitmap.height,
            bitmap.pixels.len()
        )));
    }
    Ok(())
}
