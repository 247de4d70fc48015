//! Text watermark rendering.
//!
//! Renders a [`WatermarkStyle`] into a standalone RGBA layer with a
//! transparent background, ready to be composited onto target images.
//!
//! The pipeline works on owned buffers, each stage handing its result to the
//! next:
//!
//! 1. lay out the text and measure its ink box (stroke included)
//! 2. optional blurred drop shadow, drawn first so it sits underneath
//! 3. outline (coverage dilated by the stroke width) then fill
//! 4. optional synthetic bold: nine redraws at one-pixel offsets
//! 5. optional synthetic italic: horizontal shear with bicubic resampling
//! 6. optional rotation with canvas expansion
//!
//! Output is fully deterministic: identical styles produce identical pixels.
//!
//! # Example
//!
//! ```
//! use inkstamp::watermark::{render_watermark, WatermarkStyle};
//!
//! let style = WatermarkStyle::new("Copyright 2025").with_font_size(32);
//! let layer = render_watermark(&style).unwrap();
//! assert!(layer.width() > 0 && layer.height() > 0);
//! ```

use super::compositor::{composite_layer, paint_coverage};
use super::fonts::load_font;
use super::style::WatermarkStyle;
use super::transform::{fit_height, rotate_expand, shear_horizontal};
use crate::error::{Result, WatermarkError};
use ab_glyph::{point, Font, FontArc, OutlinedGlyph, PxScale, ScaleFont};
use image::imageops;
use image::{Rgba, RgbaImage};

/// RGBA watermark layer with a transparent background.
pub type RasterLayer = RgbaImage;

/// Extra pixels between lines of multi-line text.
const LINE_SPACING: f32 = 4.0;

/// Shadow alpha, 70% of opaque.
const SHADOW_ALPHA: u8 = 178;

/// Horizontal shear applied for synthetic italics.
const ITALIC_SHEAR: f32 = 0.3;

/// Per-pixel glyph coverage in `[0, 1]`.
#[derive(Debug, Clone)]
pub(crate) struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    fn accumulate(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = (self.data[idx] + coverage).min(1.0);
    }

    fn has_ink(&self) -> bool {
        self.data.iter().any(|&c| c > 0.0)
    }

    /// Grow the covered area by a disc of `radius` pixels.
    fn dilate(&self, radius: u32) -> CoverageMask {
        let r = radius as i64;
        let offsets: Vec<(i64, i64)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect();

        let mut out = CoverageMask::new(self.width, self.height);
        let (w, h) = (self.width as i64, self.height as i64);
        for y in 0..h {
            for x in 0..w {
                let mut best = 0.0f32;
                for (dx, dy) in &offsets {
                    let (sx, sy) = (x + dx, y + dy);
                    if sx < 0 || sy < 0 || sx >= w || sy >= h {
                        continue;
                    }
                    best = best.max(self.data[(sy * w + sx) as usize]);
                    if best >= 1.0 {
                        break;
                    }
                }
                out.data[(y * w + x) as usize] = best;
            }
        }
        out
    }
}

/// Positioned glyph outlines plus the union of their pixel bounds.
struct TextLayout {
    glyphs: Vec<OutlinedGlyph>,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl TextLayout {
    fn ink_width(&self) -> u32 {
        (self.max_x - self.min_x).max(1) as u32
    }

    fn ink_height(&self) -> u32 {
        (self.max_y - self.min_y).max(1) as u32
    }

    /// Rasterize the glyph fill into a mask padded by `pad` on every side.
    fn rasterize(&self, pad: u32) -> CoverageMask {
        let mut mask =
            CoverageMask::new(self.ink_width() + 2 * pad, self.ink_height() + 2 * pad);
        let off_x = pad as i64 - self.min_x;
        let off_y = pad as i64 - self.min_y;

        for glyph in &self.glyphs {
            let bounds = glyph.px_bounds();
            let gx = bounds.min.x as i64 + off_x;
            let gy = bounds.min.y as i64 + off_y;
            glyph.draw(|px, py, coverage| {
                mask.accumulate(gx + px as i64, gy + py as i64, coverage);
            });
        }

        mask
    }
}

/// Lay out `text` line by line, with kerning, starting at the origin.
fn layout_text(font: &FontArc, text: &str, font_size: f32) -> TextLayout {
    let scale = PxScale::from(font_size);
    let scaled_font = font.as_scaled(scale);
    let line_pitch = scaled_font.height() + scaled_font.line_gap() + LINE_SPACING;
    let ascent = scaled_font.ascent();

    let mut glyphs = Vec::new();
    let mut max_advance = 0.0f32;
    let mut line_count = 0usize;

    for (line_idx, line) in text.lines().enumerate() {
        line_count = line_idx + 1;
        let baseline_y = line_idx as f32 * line_pitch + ascent;
        let mut cursor_x = 0.0f32;
        let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

        for c in line.chars() {
            let glyph_id = scaled_font.glyph_id(c);
            if let Some(prev) = prev_glyph {
                cursor_x += scaled_font.kern(prev, glyph_id);
            }

            let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, baseline_y));
            if let Some(outlined) = font.outline_glyph(glyph) {
                glyphs.push(outlined);
            }

            cursor_x += scaled_font.h_advance(glyph_id);
            prev_glyph = Some(glyph_id);
        }
        max_advance = max_advance.max(cursor_x);
    }

    if glyphs.is_empty() {
        // No ink at all: fall back to the advance box
        let height = (line_count.max(1) - 1) as f32 * line_pitch + scaled_font.height();
        return TextLayout {
            glyphs,
            min_x: 0,
            min_y: 0,
            max_x: max_advance.ceil().max(1.0) as i64,
            max_y: height.ceil().max(1.0) as i64,
        };
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for glyph in &glyphs {
        let bounds = glyph.px_bounds();
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }

    TextLayout {
        glyphs,
        min_x: min_x.floor() as i64,
        min_y: min_y.floor() as i64,
        max_x: max_x.ceil() as i64,
        max_y: max_y.ceil() as i64,
    }
}

/// Canvas size and where the stroke-inflated ink box sits on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CanvasGeometry {
    width: u32,
    height: u32,
    origin_x: i64,
    origin_y: i64,
}

impl CanvasGeometry {
    fn new(box_width: u32, box_height: u32, style: &WatermarkStyle) -> Self {
        let stroke = style.stroke_width;
        let (shadow_x, shadow_y) = style.shadow_offset;
        let bold_margin = u32::from(style.bold);

        Self {
            width: box_width + 4 * stroke + shadow_x.unsigned_abs() + 2 * bold_margin,
            height: box_height + 4 * stroke + shadow_y.unsigned_abs() + 2 * bold_margin,
            origin_x: (2 * stroke + bold_margin) as i64 + (-shadow_x as i64).max(0),
            origin_y: (2 * stroke + bold_margin) as i64 + (-shadow_y as i64).max(0),
        }
    }
}

/// Outline then fill at `(x, y)`.
fn draw_glyphs(
    target: &mut RgbaImage,
    fill: &CoverageMask,
    stroke: Option<&CoverageMask>,
    x: i64,
    y: i64,
    style: &WatermarkStyle,
) {
    if let Some(stroke) = stroke {
        paint_coverage(target, stroke, x, y, style.stroke_rgba());
    }
    paint_coverage(target, fill, x, y, style.fill_rgba());
}

/// Blurred copy of the glyph fill, offset by the shadow displacement.
fn render_shadow(fill: &CoverageMask, geometry: &CanvasGeometry, style: &WatermarkStyle) -> RgbaImage {
    let [r, g, b, _] = style.stroke_color;
    // Transparent pixels carry the shadow color so blurring does not darken edges
    let mut shadow = RgbaImage::from_pixel(geometry.width, geometry.height, Rgba([r, g, b, 0]));
    let (dx, dy) = style.shadow_offset;
    paint_coverage(
        &mut shadow,
        fill,
        geometry.origin_x + dx as i64,
        geometry.origin_y + dy as i64,
        Rgba([r, g, b, SHADOW_ALPHA]),
    );
    imageops::blur(&shadow, style.shadow_blur_radius)
}

fn check_text(style: &WatermarkStyle) -> Result<()> {
    if style.text.trim().is_empty() {
        return Err(WatermarkError::EmptyText);
    }
    style.validate()
}

/// Size of the stroke-inflated ink box of `style`'s text, in pixels.
pub fn measure_text(style: &WatermarkStyle) -> Result<(u32, u32)> {
    check_text(style)?;
    let font = load_font(style.font_path.as_deref())?;
    let layout = layout_text(&font, &style.text, style.font_size as f32);
    Ok((
        layout.ink_width() + 2 * style.stroke_width,
        layout.ink_height() + 2 * style.stroke_width,
    ))
}

/// Render `style` to an RGBA layer.
///
/// # Errors
///
/// * [`WatermarkError::EmptyText`] if the text is empty or whitespace only
/// * [`WatermarkError::FontLoad`] if the font file cannot be read or parsed
/// * [`WatermarkError::InvalidStyle`] for out-of-range style parameters
pub fn render_watermark(style: &WatermarkStyle) -> Result<RasterLayer> {
    check_text(style)?;

    let font = load_font(style.font_path.as_deref())?;
    let layout = layout_text(&font, &style.text, style.font_size as f32);

    let fill = layout.rasterize(style.stroke_width);
    let stroke = (style.stroke_width > 0).then(|| fill.dilate(style.stroke_width));
    let geometry = CanvasGeometry::new(fill.width(), fill.height(), style);

    let shadow = (style.shadow_blur_radius > 0.0).then(|| render_shadow(&fill, &geometry, style));

    let mut canvas = RgbaImage::new(geometry.width, geometry.height);
    let (x, y) = (geometry.origin_x, geometry.origin_y);

    if !style.bold && !style.italic {
        if let Some(shadow) = &shadow {
            composite_layer(&mut canvas, shadow, 0, 0);
        }
        draw_glyphs(&mut canvas, &fill, stroke.as_ref(), x, y, style);
    } else {
        let mut glyph_layer = RgbaImage::new(geometry.width, geometry.height);
        if style.bold {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    draw_glyphs(&mut glyph_layer, &fill, stroke.as_ref(), x + dx, y + dy, style);
                }
            }
        } else {
            draw_glyphs(&mut glyph_layer, &fill, stroke.as_ref(), x, y, style);
        }

        let mut shadow = shadow;
        if style.italic {
            glyph_layer = fit_height(shear_horizontal(&glyph_layer, ITALIC_SHEAR), geometry.height);
            shadow = shadow
                .map(|layer| fit_height(shear_horizontal(&layer, ITALIC_SHEAR), geometry.height));
            canvas = RgbaImage::new(glyph_layer.width(), glyph_layer.height());
        }

        if let Some(shadow) = &shadow {
            composite_layer(&mut canvas, shadow, 0, 0);
        }
        composite_layer(&mut canvas, &glyph_layer, 0, 0);
    }

    let rotation = style.normalized_rotation();
    if rotation != 0.0 {
        canvas = rotate_expand(&canvas, rotation);
    }

    tracing::debug!(
        width = canvas.width(),
        height = canvas.height(),
        font_size = style.font_size,
        bold = style.bold,
        italic = style.italic,
        has_ink = fill.has_ink(),
        "Rendered text watermark"
    );

    Ok(canvas)
}
