//! WebP conversion of uploaded images.

use image::{DynamicImage, GenericImageView};
use tracing::{debug, error};

use crate::contract::{EncodedImage, ImageEncoder, ImageMetadata};
use crate::error::DecodeError;

/// Lossy quality on libwebp's 0-100 scale.
pub const WEBP_QUALITY: f32 = 80.0;

/// Re-encodes any raster format the `image` crate can sniff as lossy WebP.
#[derive(Debug, Clone, Copy)]
pub struct WebpEncoder {
    quality: f32,
}

impl WebpEncoder {
    pub fn new() -> Self {
        Self {
            quality: WEBP_QUALITY,
        }
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }
}

impl Default for WebpEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEncoder for WebpEncoder {
    fn extension(&self) -> &'static str {
        "webp"
    }

    fn encode(&self, raw: &[u8]) -> Result<EncodedImage, DecodeError> {
        let format = image::guess_format(raw).map_err(|e| {
            error!(error = %e, bytes = raw.len(), "Could not detect image format");
            DecodeError::UnknownFormat
        })?;
        let format_name = format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("unknown")
            .to_string();

        let decoded = image::load_from_memory_with_format(raw, format).map_err(|e| {
            error!(error = %e, format = %format_name, "Failed to decode image");
            DecodeError::Image {
                format: format_name.clone(),
                message: e.to_string(),
            }
        })?;
        let (width, height) = decoded.dimensions();
        debug!(width, height, format = %format_name, "Decoded source image");

        let bytes = encode_lossy(&decoded, self.quality)?;
        Ok(EncodedImage {
            bytes,
            metadata: ImageMetadata {
                width,
                height,
                source_format: format_name,
            },
        })
    }
}

// libwebp only takes 8-bit RGB or RGBA buffers.
fn encode_lossy(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, DecodeError> {
    let (width, height) = img.dimensions();
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
    };
    encoded
        .map(|memory| memory.to_vec())
        .map_err(|e| DecodeError::Encode(format!("{e:?}")))
}
