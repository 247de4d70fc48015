// Decoding, orientation and encoding through the public API

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use inkstamp::image_io::{
    decode_bytes, decode_file, encoder_for, exif_orientation, resize_exact, OutputFormat,
};
use inkstamp::WatermarkError;
use rstest::rstest;
use std::io::Cursor;

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([180, 60, 20, 255]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .to_rgb8()
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

/// Insert an APP1 segment holding a single-entry EXIF IFD with the given
/// orientation right after the JPEG SOI marker.
fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    // IFD0 with one entry: Orientation, SHORT, count 1
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    // No next IFD
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = (payload.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[test]
fn test_exif_orientation_is_read() {
    let data = with_exif_orientation(&jpeg_bytes(12, 8), 6);
    assert_eq!(exif_orientation(&data), Some(6));
    assert_eq!(exif_orientation(&jpeg_bytes(12, 8)), None);
}

#[rstest]
#[case(1, (12, 8))]
#[case(3, (12, 8))]
#[case(6, (8, 12))]
#[case(8, (8, 12))]
fn test_decode_applies_orientation(#[case] orientation: u16, #[case] expected: (u32, u32)) {
    let data = with_exif_orientation(&jpeg_bytes(12, 8), orientation);
    let decoded = decode_bytes(&data).unwrap();
    assert_eq!(decoded.dimensions(), expected);
}

#[test]
fn test_decode_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n truncated").unwrap();

    match decode_file(&path) {
        Err(WatermarkError::SourceDecode { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected SourceDecode, got {:?}", other.map(|i| i.dimensions())),
    }
}

#[test]
fn test_decode_bmp_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.bmp");
    RgbaImage::from_pixel(5, 3, Rgba([1, 2, 3, 255]))
        .save(&path)
        .unwrap();
    assert_eq!(decode_file(&path).unwrap().dimensions(), (5, 3));
}

#[rstest]
#[case(OutputFormat::Png)]
#[case(OutputFormat::Jpeg)]
fn test_encode_keeps_dimensions(#[case] format: OutputFormat) {
    let img = RgbaImage::from_pixel(30, 20, Rgba([100, 100, 100, 255]));
    let resized = resize_exact(img, 15, 40).unwrap();
    let bytes = encoder_for(format, 90).encode(&resized).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (15, 40));
}
