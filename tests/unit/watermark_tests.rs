// Rendering and compositing properties

use image::{Rgba, RgbaImage};
use inkstamp::watermark::{
    anchor_placement, compose_image, measure_text, render_watermark, Anchor, Color,
    TemplateRecord, WatermarkStyle,
};
use inkstamp::WatermarkError;
use rstest::rstest;

fn ink_pixels(layer: &RgbaImage) -> usize {
    layer.pixels().filter(|p| p[3] > 0).count()
}

fn style(text: &str) -> WatermarkStyle {
    WatermarkStyle::new(text).with_font_size(32)
}

#[rstest]
#[case("A")]
#[case("Copyright 2025")]
#[case("© 2025")]
#[case("line one\nline two")]
#[case("  padded  ")]
fn test_non_empty_text_renders_visible_layer(#[case] text: &str) {
    let layer = render_watermark(&style(text)).unwrap();
    assert!(layer.width() > 0 && layer.height() > 0);
    assert!(ink_pixels(&layer) > 0);
}

#[rstest]
#[case("")]
#[case(" ")]
#[case("\n\n")]
#[case("\t \r\n")]
fn test_blank_text_is_rejected(#[case] text: &str) {
    assert!(matches!(
        render_watermark(&style(text)),
        Err(WatermarkError::EmptyText)
    ));
}

#[test]
fn test_zero_font_size_is_invalid_style() {
    let err = render_watermark(&style("x").with_font_size(0)).unwrap_err();
    assert!(matches!(err, WatermarkError::InvalidStyle(_)));
}

#[test]
fn test_rendering_is_deterministic() {
    let s = style("Déjà vu")
        .with_bold(true)
        .with_italic(true)
        .with_rotation(17.0)
        .with_color(Color::new(200, 40, 90));
    assert_eq!(render_watermark(&s).unwrap(), render_watermark(&s).unwrap());
}

#[test]
fn test_bold_adds_ink() {
    let plain = render_watermark(&style("Bold")).unwrap();
    let bold = render_watermark(&style("Bold").with_bold(true)).unwrap();
    assert!(ink_pixels(&bold) > ink_pixels(&plain));
}

#[test]
fn test_italic_widens_canvas() {
    let plain = render_watermark(&style("Slant")).unwrap();
    let italic = render_watermark(&style("Slant").with_italic(true)).unwrap();
    assert!(italic.width() > plain.width());
    assert_eq!(italic.height(), plain.height());
}

#[rstest]
#[case(90.0)]
#[case(270.0)]
#[case(-90.0)]
fn test_quarter_rotation_swaps_axes(#[case] degrees: f32) {
    let plain = render_watermark(&style("Turn")).unwrap();
    let rotated = render_watermark(&style("Turn").with_rotation(degrees)).unwrap();
    assert_eq!(rotated.dimensions(), (plain.height(), plain.width()));
}

#[test]
fn test_full_turn_is_identity() {
    let plain = render_watermark(&style("Turn")).unwrap();
    let turned = render_watermark(&style("Turn").with_rotation(360.0)).unwrap();
    assert_eq!(plain, turned);
}

#[test]
fn test_measure_matches_plain_canvas() {
    let s = style("Measure").with_stroke(3, [0, 0, 0, 255]).with_shadow((4, 1), 2.0);
    let (w, h) = measure_text(&s).unwrap();
    let layer = render_watermark(&s).unwrap();
    assert_eq!(layer.dimensions(), (w + 12 + 4, h + 12 + 1));
}

#[rstest]
#[case((800, 600))]
#[case((1000, 800))]
#[case((333, 77))]
fn test_center_anchor_is_stable(#[case] image: (u32, u32)) {
    let layer = render_watermark(&style("Center")).unwrap();
    let first = anchor_placement(image, layer.dimensions(), Anchor::CENTER);
    for _ in 0..3 {
        assert_eq!(
            anchor_placement(image, layer.dimensions(), Anchor::CENTER),
            first
        );
    }
    assert_eq!(first.x + (layer.width() / 2) as i64, (image.0 / 2) as i64);
    assert_eq!(first.y + (layer.height() / 2) as i64, (image.1 / 2) as i64);
}

#[test]
fn test_compose_image_changes_only_layer_area() {
    let source = RgbaImage::from_pixel(400, 300, Rgba([20, 40, 60, 255]));
    let layer = render_watermark(&style("Mark").with_opacity(1.0)).unwrap();
    let out = compose_image(&source, &layer, Anchor::CENTER);

    assert_eq!(out.dimensions(), source.dimensions());
    assert_eq!(out.get_pixel(0, 0), source.get_pixel(0, 0));
    assert_eq!(out.get_pixel(399, 299), source.get_pixel(399, 299));
    assert!(out.pixels().zip(source.pixels()).any(|(a, b)| a != b));
    // Opaque source stays opaque
    assert!(out.pixels().all(|p| p[3] == 255));
}

#[test]
fn test_template_style_renders() {
    let record = TemplateRecord::from_json(r#"{"text": "Template", "position": "center"}"#).unwrap();
    let layer = render_watermark(&record.to_style()).unwrap();
    assert!(ink_pixels(&layer) > 0);
    assert_eq!(record.anchor().unwrap(), Anchor::CENTER);
}
