//! Export driven by a YAML configuration file

use image::{Rgba, RgbaImage};
use inkstamp::config::ExportConfig;
use inkstamp::export::Exporter;
use inkstamp::watermark::WatermarkStyle;
use inkstamp::WatermarkError;

#[test]
fn test_yaml_config_jpeg_export() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("photos");
    std::fs::create_dir(&src).unwrap();
    for name in ["a.png", "b.png"] {
        RgbaImage::from_pixel(80, 60, Rgba([90, 120, 150, 255]))
            .save(src.join(name))
            .unwrap();
    }

    let config_path = dir.path().join("export.yaml");
    std::fs::write(
        &config_path,
        format!(
            r#"
output_dir: {out}
prefix: "wm_"
suffix: ""
output_format: jpeg
jpeg_quality: 80
max_concurrency: 2
resize:
  width: 40
  height: 30
anchor:
  x: 0.9
  y: 0.9
watermark:
  text: "Studio"
  font_size: 14
  italic: true
"#,
            out = dir.path().join("export").display()
        ),
    )
    .unwrap();

    let config = ExportConfig::from_file(&config_path).unwrap();
    config.validate().unwrap();
    let style: WatermarkStyle = config.watermark.clone().unwrap();

    let exporter = Exporter::new(config);
    let sources = exporter.collect_sources(&[&src]).unwrap();
    assert_eq!(sources.len(), 2);

    let outcomes = exporter.export(&sources, &style, |_| {}).unwrap();
    assert!(outcomes.iter().all(|o| o.success), "{:?}", outcomes);

    for name in ["wm_a.jpg", "wm_b.jpg"] {
        let output = image::open(dir.path().join("export").join(name)).unwrap();
        assert_eq!((output.width(), output.height()), (40, 30));
    }
}

#[test]
fn test_export_into_source_folder_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("photo.png");
    RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]))
        .save(&source)
        .unwrap();

    let exporter = Exporter::new(ExportConfig::new(dir.path()));
    let err = exporter
        .export(&[source], &WatermarkStyle::new("x"), |_| {})
        .unwrap_err();
    assert!(matches!(err, WatermarkError::Config(_)));
}

#[test]
fn test_invalid_concurrency_fails_before_work() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ExportConfig::new(dir.path().join("out"));
    config.max_concurrency = 0;

    let err = Exporter::new(config)
        .export(&[], &WatermarkStyle::new("x"), |_| {})
        .unwrap_err();
    assert!(matches!(err, WatermarkError::Config(_)));
    assert!(!dir.path().join("out").exists());
}
