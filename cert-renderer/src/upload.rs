//! Image upload decoding.
//!
//! Uploaded files become self-contained data URIs so documents never depend
//! on external files.

use std::sync::Arc;

use base64::Engine;
use cert_core::{DecodedImage, EditorError, EditorResult, ImageDecoder};

use crate::error::{RenderError, RenderResult};

/// Largest upload accepted, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// [`ImageDecoder`] backed by the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct RasterImageDecoder {
    max_bytes: usize,
}

impl Default for RasterImageDecoder {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl RasterImageDecoder {
    /// Decoder accepting files up to `max_bytes`.
    #[must_use]
    pub fn with_limit(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    fn decode_bytes(&self, bytes: &[u8]) -> RenderResult<DecodedImage> {
        if bytes.len() > self.max_bytes {
            return Err(RenderError::Decode(format!(
                "{} bytes exceeds the {} byte limit",
                bytes.len(),
                self.max_bytes
            )));
        }

        let format = image::guess_format(bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| RenderError::Decode(e.to_string()))?;

        #[allow(clippy::cast_precision_loss)]
        let (width, height) = (img.width() as f32, img.height() as f32);
        tracing::debug!("Decoded {format:?} upload: {width}x{height}");

        Ok(DecodedImage {
            reference: to_data_uri(format.to_mime_type(), bytes),
            width,
            height,
        })
    }
}

impl ImageDecoder for RasterImageDecoder {
    fn decode(&self, bytes: &[u8]) -> EditorResult<DecodedImage> {
        Ok(self.decode_bytes(bytes)?)
    }
}

/// Decode `bytes` on the blocking pool so the editing thread stays free.
///
/// # Errors
///
/// Returns [`EditorError::Validation`] for unsupported files and
/// [`EditorError::Export`] if the task fails.
pub async fn decode_in_background<D>(decoder: Arc<D>, bytes: Vec<u8>) -> EditorResult<DecodedImage>
where
    D: ImageDecoder + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || decoder.decode(&bytes))
        .await
        .map_err(|e| EditorError::from(RenderError::Task(e.to_string())))?
}

/// Encode `bytes` as a base64 data URI.
#[must_use]
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Extract the bytes of a base64 data URI.
///
/// # Errors
///
/// Returns an error if `uri` is not a base64 data URI.
pub fn parse_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Decode("not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Decode("invalid data URI: missing comma".to_string()))?;
    if !metadata.ends_with(";base64") {
        return Err(RenderError::Decode("only base64 data URIs are supported".to_string()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| RenderError::Decode(format!("invalid base64: {e}")))
}
