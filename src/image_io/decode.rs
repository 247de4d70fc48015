//! Source image decoding with EXIF orientation correction.

use crate::error::{Result, WatermarkError};
use exif::{In, Tag};
use image::io::Reader as ImageReader;
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Read and decode `path` into RGBA, rotated/flipped so the pixels match the
/// intended visual orientation.
pub fn decode_file(path: &Path) -> Result<RgbaImage> {
    let data = std::fs::read(path).map_err(|e| WatermarkError::decode(path, e))?;
    decode_bytes(&data).map_err(|message| WatermarkError::decode(path, message))
}

/// Decode in-memory image data; the error is a plain message so callers can
/// attach the path they know about.
pub fn decode_bytes(data: &[u8]) -> std::result::Result<RgbaImage, String> {
    let image = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())?;

    let image = match exif_orientation(data) {
        Some(orientation) if orientation != 1 => {
            tracing::debug!(orientation, "Applying EXIF orientation");
            apply_orientation(image, orientation)
        }
        _ => image,
    };

    Ok(image.to_rgba8())
}

/// EXIF orientation tag (1-8) of the primary image, if present.
pub fn exif_orientation(data: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    field.value.get_uint(0).filter(|o| (1..=8).contains(o))
}

/// Undo the camera orientation recorded in EXIF.
///
/// `image`'s rotations are clockwise, so orientation 6 (camera turned
/// clockwise) is undone by `rotate90` and 8 by `rotate270`.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        // Transpose
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        // Transverse
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}
