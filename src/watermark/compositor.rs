//! Watermark compositor for blending rendered layers onto images.
//!
//! Compositing happens in two steps, mirroring how a layer is "pasted" and
//! then "flattened":
//!
//! 1. the layer is pasted onto a full-size transparent overlay at its
//!    anchored position, using its own alpha as the paste mask
//! 2. the overlay is composited over the source with the straight-alpha
//!    "over" operator
//!
//! [`compose`] runs the whole file-to-file pipeline: decode (with EXIF
//! orientation), optional resize, composite, encode and write.
//!
//! # Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use inkstamp::watermark::{compose_image, Anchor};
//!
//! let source = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
//! let layer = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
//!
//! let out = compose_image(&source, &layer, Anchor::CENTER);
//! assert_eq!(out.get_pixel(50, 50), &Rgba([255, 255, 255, 255]));
//! assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
//! ```

use super::position::{anchor_placement, Anchor};
use super::text_renderer::{CoverageMask, RasterLayer};
use crate::error::Result;
use crate::image_io::{decode_file, encoder_for, resize_exact, OutputFormat, DEFAULT_JPEG_QUALITY};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One source image to watermark and where to write the result.
#[derive(Clone)]
pub struct CompositionRequest {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    /// Shared, read-only rendered watermark.
    pub watermark_layer: Arc<RasterLayer>,
    pub anchor: Anchor,
    pub output_format: OutputFormat,
    /// 1-100, JPEG only
    pub jpeg_quality: u8,
    /// Exact output size; aspect ratio is not preserved
    pub resize_target: Option<(u32, u32)>,
}

impl CompositionRequest {
    /// Request with a centered anchor, PNG output and no resize.
    pub fn new(
        source_path: impl Into<PathBuf>,
        destination_path: impl Into<PathBuf>,
        watermark_layer: Arc<RasterLayer>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            watermark_layer,
            anchor: Anchor::CENTER,
            output_format: OutputFormat::Png,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            resize_target: None,
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_resize(mut self, width: u32, height: u32) -> Self {
        self.resize_target = Some((width, height));
        self
    }
}

impl std::fmt::Debug for CompositionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionRequest")
            .field("source_path", &self.source_path)
            .field("destination_path", &self.destination_path)
            .field(
                "layer_dimensions",
                &(self.watermark_layer.width(), self.watermark_layer.height()),
            )
            .field("anchor", &self.anchor)
            .field("output_format", &self.output_format)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("resize_target", &self.resize_target)
            .finish()
    }
}

/// Watermark the request's source and write it to its destination.
///
/// Parent directories of the destination are created as needed; an existing
/// file is overwritten.
///
/// # Errors
///
/// * [`SourceDecode`](crate::error::WatermarkError::SourceDecode) if the
///   source cannot be read or decoded
/// * [`Resize`](crate::error::WatermarkError::Resize) for a zero resize target
/// * [`Encode`](crate::error::WatermarkError::Encode) if encoding fails
/// * [`Io`](crate::error::WatermarkError::Io) if writing fails
pub fn compose(request: &CompositionRequest) -> Result<PathBuf> {
    let mut source = decode_file(&request.source_path)?;

    if let Some((width, height)) = request.resize_target {
        source = resize_exact(source, width, height)?;
    }

    let composed = compose_image(&source, &request.watermark_layer, request.anchor);

    let encoder = encoder_for(request.output_format, request.jpeg_quality);
    let bytes = encoder.encode(&composed)?;

    write_output(&request.destination_path, &bytes)?;

    tracing::debug!(
        source = %request.source_path.display(),
        destination = %request.destination_path.display(),
        format = %request.output_format,
        width = composed.width(),
        height = composed.height(),
        bytes = bytes.len(),
        "Composed watermarked image"
    );

    Ok(request.destination_path.clone())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Composite `layer` over `source`, centered on `anchor`.
///
/// The result always has the source's dimensions.
pub fn compose_image(source: &RgbaImage, layer: &RgbaImage, anchor: Anchor) -> RgbaImage {
    let placement = anchor_placement(source.dimensions(), layer.dimensions(), anchor);

    let mut overlay = RgbaImage::new(source.width(), source.height());
    paste_with_mask(&mut overlay, layer, placement.x, placement.y);

    let mut out = source.clone();
    composite_layer(&mut out, &overlay, 0, 0);
    out
}

/// Paste `layer` at `(x, y)` using its own alpha as the mask.
///
/// Every channel, alpha included, moves from the existing pixel toward the
/// layer pixel by `alpha / 255`. Parts outside `target` are dropped.
pub fn paste_with_mask(target: &mut RgbaImage, layer: &RgbaImage, x: i64, y: i64) {
    for_each_overlap(target, layer, x, y, |dst, src| {
        *dst = lerp_pixel(*dst, *src, src[3]);
    });
}

/// Move every channel of `under` toward `over` by `mask / 255`.
fn lerp_pixel(under: Rgba<u8>, over: Rgba<u8>, mask: u8) -> Rgba<u8> {
    match mask {
        0 => return under,
        255 => return over,
        _ => {}
    }
    let mask = mask as u32;
    let lerp = |under: u8, over: u8| -> u8 {
        ((over as u32 * mask + under as u32 * (255 - mask) + 127) / 255) as u8
    };
    Rgba([
        lerp(under[0], over[0]),
        lerp(under[1], over[1]),
        lerp(under[2], over[2]),
        lerp(under[3], over[3]),
    ])
}

/// Composite `layer` over `target` at `(x, y)` with the "over" operator.
pub(crate) fn composite_layer(target: &mut RgbaImage, layer: &RgbaImage, x: i64, y: i64) {
    for_each_overlap(target, layer, x, y, |dst, src| {
        *dst = blend_over(*dst, *src);
    });
}

/// Paint `color` into `target` at `(x, y)`, using mask coverage as the
/// paste mask.
///
/// Pixels move toward `color` rather than accumulating over it, so painting
/// the same mask twice never raises alpha above `color`'s own.
pub(crate) fn paint_coverage(
    target: &mut RgbaImage,
    mask: &CoverageMask,
    x: i64,
    y: i64,
    color: Rgba<u8>,
) {
    let (tw, th) = (target.width() as i64, target.height() as i64);
    for my in 0..mask.height() {
        let ty = y + my as i64;
        if ty < 0 || ty >= th {
            continue;
        }
        for mx in 0..mask.width() {
            let tx = x + mx as i64;
            if tx < 0 || tx >= tw {
                continue;
            }
            let coverage = mask.get(mx, my);
            if coverage <= 0.0 {
                continue;
            }
            let weight = (coverage * 255.0).round().clamp(0.0, 255.0) as u8;
            let pixel = target.get_pixel_mut(tx as u32, ty as u32);
            *pixel = lerp_pixel(*pixel, color, weight);
        }
    }
}

/// Visit every overlapping `(target, layer)` pixel pair when `layer`'s
/// top-left corner sits at `(x, y)`.
fn for_each_overlap(
    target: &mut RgbaImage,
    layer: &RgbaImage,
    x: i64,
    y: i64,
    mut f: impl FnMut(&mut Rgba<u8>, &Rgba<u8>),
) {
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + layer.width() as i64).min(target.width() as i64);
    let y_end = (y + layer.height() as i64).min(target.height() as i64);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = layer.get_pixel((tx - x) as u32, (ty - y) as u32);
            let dst = target.get_pixel_mut(tx as u32, ty as u32);
            f(dst, src);
        }
    }
}

/// Straight-alpha Porter-Duff "over": `foreground` on top of `background`.
pub(crate) fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match foreground[3] {
        0 => return background,
        255 => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let result = (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
