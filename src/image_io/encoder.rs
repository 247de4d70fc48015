//! Encoders for the supported output formats.

use super::format::OutputFormat;
use crate::error::{Result, WatermarkError};
use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder as ImagePngEncoder};
use image::{ColorType, ImageEncoder as _, RgbaImage};
use std::io::Cursor;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Encodes an RGBA image into a file format.
pub trait ImageEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>>;
}

/// JPEG encoder. Alpha is discarded without filling a background.
///
/// With the `mozjpeg` feature, `optimize` switches to libjpeg with
/// optimized Huffman tables. Without it the flag has no effect.
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
    optimize: bool,
}

impl JpegEncoder {
    /// Quality is clamped to 1-100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            optimize: true,
        }
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn optimize(&self) -> bool {
        self.optimize
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>> {
        let rgb = rgba_to_rgb(image.as_raw());

        #[cfg(feature = "mozjpeg")]
        if self.optimize {
            return super::mozjpeg::encode_rgb(&rgb, image.width(), image.height(), self.quality);
        }

        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, self.quality)
            .write_image(&rgb, image.width(), image.height(), ColorType::Rgb8)
            .map_err(|e| WatermarkError::encode("jpeg", e))?;

        Ok(output.into_inner())
    }
}

/// Lossless PNG encoder with default compression and adaptive filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>> {
        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new_with_quality(&mut output, CompressionType::Default, FilterType::Adaptive)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
            .map_err(|e| WatermarkError::encode("png", e))?;

        Ok(output.into_inner())
    }
}

/// Encoder for `format`. `jpeg_quality` is ignored for PNG.
pub fn encoder_for(format: OutputFormat, jpeg_quality: u8) -> Box<dyn ImageEncoder> {
    match format {
        OutputFormat::Png => Box::new(PngEncoder),
        OutputFormat::Jpeg => Box::new(JpegEncoder::new(jpeg_quality)),
    }
}

/// Drop the alpha channel from packed RGBA bytes.
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}
