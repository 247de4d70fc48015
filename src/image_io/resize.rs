//! Exact-size resampling and thumbnails with fast_image_resize.

use super::decode::decode_file;
use crate::error::{Result, WatermarkError};
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::RgbaImage;
use std::num::NonZeroU32;
use std::path::Path;

/// Longest edge of a preview thumbnail.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 1024;

/// Resize `image` to exactly `width` x `height` with a Lanczos3 filter.
///
/// The aspect ratio is not preserved. Returns the input untouched when it
/// already has the requested size.
pub fn resize_exact(image: RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    if image.dimensions() == (width, height) {
        return Ok(image);
    }

    let (src_w, src_h) = image.dimensions();
    let src_width =
        NonZeroU32::new(src_w).ok_or_else(|| WatermarkError::Resize("Source width is 0".into()))?;
    let src_height = NonZeroU32::new(src_h)
        .ok_or_else(|| WatermarkError::Resize("Source height is 0".into()))?;
    let dst_width =
        NonZeroU32::new(width).ok_or_else(|| WatermarkError::Resize("Target width is 0".into()))?;
    let dst_height = NonZeroU32::new(height)
        .ok_or_else(|| WatermarkError::Resize("Target height is 0".into()))?;

    let src_image = Image::from_vec_u8(src_width, src_height, image.into_raw(), PixelType::U8x4)
        .map_err(|e| WatermarkError::Resize(format!("Failed to create source image: {:?}", e)))?;
    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| WatermarkError::Resize(format!("Resize operation failed: {:?}", e)))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| WatermarkError::Resize("Failed to create output image buffer".into()))
}

/// Shrink `image` so neither edge exceeds `max_size`, keeping the aspect
/// ratio. Images already within bounds are returned as-is; nothing is
/// enlarged.
pub fn thumbnail(image: RgbaImage, max_size: u32) -> Result<RgbaImage> {
    if max_size == 0 {
        return Err(WatermarkError::Resize("Thumbnail size is 0".into()));
    }
    let (width, height) = image.dimensions();
    if width <= max_size && height <= max_size {
        return Ok(image);
    }

    let scale = max_size as f64 / width.max(height) as f64;
    let fit = |edge: u32| ((edge as f64 * scale).round() as u32).clamp(1, max_size);
    resize_exact(image, fit(width), fit(height))
}

/// Decode `path` with orientation correction and shrink it to a
/// [`thumbnail`] of at most `max_size` pixels per edge.
pub fn thumbnail_file(path: &Path, max_size: u32) -> Result<RgbaImage> {
    thumbnail(decode_file(path)?, max_size)
}
