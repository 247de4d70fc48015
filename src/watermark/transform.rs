//! Affine transforms for watermark layers.
//!
//! Shear (synthetic italic) and rotation both resample with a bicubic
//! (Catmull-Rom) kernel over premultiplied alpha, so transparent
//! surroundings never bleed dark fringes into the glyph edges.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Catmull-Rom weight for a tap at distance `t`.
fn cubic_weight(t: f32) -> f32 {
    const A: f32 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

/// Sample `image` at continuous coordinates `(u, v)`, where pixel `(i, j)`
/// covers `[i, i + 1) x [j, j + 1)`. Taps outside the image are transparent.
pub fn sample_bicubic(image: &RgbaImage, u: f32, v: f32) -> Rgba<u8> {
    let fx = u - 0.5;
    let fy = v - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let (w, h) = (image.width() as i64, image.height() as i64);

    let mut acc = [0.0f32; 4];
    for j in -1..=2i64 {
        let sy = y0 + j;
        if sy < 0 || sy >= h {
            continue;
        }
        let wy = cubic_weight(ty - j as f32);
        if wy == 0.0 {
            continue;
        }
        for i in -1..=2i64 {
            let sx = x0 + i;
            if sx < 0 || sx >= w {
                continue;
            }
            let weight = wy * cubic_weight(tx - i as f32);
            let p = image.get_pixel(sx as u32, sy as u32);
            let a = p[3] as f32;
            if a == 0.0 {
                continue;
            }
            let premul = a / 255.0;
            acc[0] += p[0] as f32 * premul * weight;
            acc[1] += p[1] as f32 * premul * weight;
            acc[2] += p[2] as f32 * premul * weight;
            acc[3] += a * weight;
        }
    }

    let alpha = acc[3].clamp(0.0, 255.0);
    if alpha < 0.5 {
        return Rgba([0, 0, 0, 0]);
    }
    let unpremul = |c: f32| (c * 255.0 / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([
        unpremul(acc[0]),
        unpremul(acc[1]),
        unpremul(acc[2]),
        alpha.round() as u8,
    ])
}

/// Shear `image` horizontally so the top edge leans right by `factor * height`.
///
/// The canvas is widened by `ceil(factor * height)` so nothing is clipped.
pub fn shear_horizontal(image: &RgbaImage, factor: f32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let extra = (factor.abs() * h as f32).ceil() as u32;
    let mut sheared = RgbaImage::new(w + extra, h.max(1));
    let shift = if factor < 0.0 { extra as f32 } else { 0.0 };

    for (x, y, pixel) in sheared.enumerate_pixels_mut() {
        let cy = y as f32 + 0.5;
        let cx = x as f32 + 0.5;
        // Inverse of x' = x + factor * (h - y)
        let u = cx - factor * (h as f32 - cy) - shift;
        *pixel = sample_bicubic(image, u, cy);
    }

    sheared
}

/// Resize `image` to `height`, keeping the aspect ratio. No-op when the
/// height already matches.
pub fn fit_height(image: RgbaImage, height: u32) -> RgbaImage {
    if image.height() == height || height == 0 {
        return image;
    }
    let scale = height as f32 / image.height() as f32;
    let width = ((image.width() as f32 * scale).round() as u32).max(1);
    imageops::resize(&image, width, height, FilterType::CatmullRom)
}

/// Rotate `image` counter-clockwise by `degrees`, expanding the canvas to the
/// rotated bounding box.
pub fn rotate_expand(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let degrees = degrees.rem_euclid(360.0);

    // Quarter turns are exact pixel permutations.
    match degrees {
        d if d == 0.0 => return image.clone(),
        d if d == 90.0 => return imageops::rotate270(image),
        d if d == 180.0 => return imageops::rotate180(image),
        d if d == 270.0 => return imageops::rotate90(image),
        _ => {}
    }

    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;

    // Shave float noise before ceil so near-axis angles do not gain a column.
    let dst_w = ((src_w * cos.abs() + src_h * sin.abs()) - 1e-3).ceil().max(1.0) as u32;
    let dst_h = ((src_w * sin.abs() + src_h * cos.abs()) - 1e-3).ceil().max(1.0) as u32;

    let mut rotated = RgbaImage::new(dst_w, dst_h);

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    for (dx, dy, pixel) in rotated.enumerate_pixels_mut() {
        let rx = dx as f32 + 0.5 - dst_cx;
        let ry = dy as f32 + 0.5 - dst_cy;

        // Inverse of the on-screen counter-clockwise rotation (y grows down)
        let u = rx * cos - ry * sin + src_cx;
        let v = rx * sin + ry * cos + src_cy;

        *pixel = sample_bicubic(image, u, v);
    }

    rotated
}
