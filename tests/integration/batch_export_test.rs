//! Batch export end-to-end tests
//!
//! Every test works in its own temporary directory:
//!   sources → render → plan/reserve → BatchExecutor → files on disk

use image::{Rgba, RgbaImage};
use inkstamp::export::{BatchExecutor, CancellationFlag, Exporter, JobOutcome, ProgressEvent};
use inkstamp::watermark::{
    anchor_placement, compose, render_watermark, Anchor, CompositionRequest, WatermarkStyle,
};
use inkstamp::config::ExportConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn write_source(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
    .save(path)
    .unwrap();
}

fn make_sources(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("img_{}.png", i));
            write_source(&path, 64, 48);
            path
        })
        .collect()
}

fn requests_for(sources: &[PathBuf], out: &Path, style: &WatermarkStyle) -> Vec<CompositionRequest> {
    let layer = Arc::new(render_watermark(style).unwrap());
    sources
        .iter()
        .map(|source| {
            let name = source.file_name().unwrap();
            CompositionRequest::new(source, out.join(name), layer.clone())
                .with_anchor(Anchor::new(0.5, 0.5))
        })
        .collect()
}

fn result_set(outcomes: &[JobOutcome]) -> HashSet<(PathBuf, bool)> {
    outcomes
        .iter()
        .map(|o| (o.source_path.clone(), o.success))
        .collect()
}

#[test]
fn test_batch_with_one_bad_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = make_sources(dir.path(), 5);
    let bad = dir.path().join("broken.jpg");
    std::fs::write(&bad, b"this is not a jpeg").unwrap();
    sources.insert(2, bad);

    let out = dir.path().join("out");
    let jobs = requests_for(&sources, &out, &WatermarkStyle::new("batch").with_font_size(16));

    let mut events: Vec<ProgressEvent> = Vec::new();
    let outcomes = BatchExecutor::new(3)
        .run(jobs, |event| events.push(event))
        .unwrap();

    assert_eq!(outcomes.len(), 6);
    assert_eq!(events.len(), 6);

    let failures: Vec<_> = outcomes.iter().filter(|o| !o.success).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].job_id, 2);
    assert!(
        failures[0].message.starts_with("Error (broken.jpg): "),
        "{}",
        failures[0].message
    );

    for outcome in outcomes.iter().filter(|o| o.success) {
        assert!(outcome.destination_path.exists());
        assert!(outcome.message.starts_with("Saved: "));
    }

    let completed: Vec<usize> = events.iter().map(|e| e.completed).collect();
    assert_eq!(completed, (1..=6).collect::<Vec<_>>());
}

#[test]
fn test_concurrency_does_not_change_results() {
    let dir = tempfile::tempdir().unwrap();
    let sources = make_sources(dir.path(), 5);
    let style = WatermarkStyle::new("same").with_font_size(16);

    let serial = BatchExecutor::new(1)
        .run(requests_for(&sources, &dir.path().join("serial"), &style), |_| {})
        .unwrap();
    let parallel = BatchExecutor::new(5)
        .run(requests_for(&sources, &dir.path().join("parallel"), &style), |_| {})
        .unwrap();

    assert_eq!(result_set(&serial), result_set(&parallel));
    assert!(serial.iter().all(|o| o.success));

    // Same pixels regardless of scheduling
    for source in &sources {
        let name = source.file_name().unwrap();
        let a = image::open(dir.path().join("serial").join(name)).unwrap();
        let b = image::open(dir.path().join("parallel").join(name)).unwrap();
        assert_eq!(a.to_rgba8(), b.to_rgba8());
    }
}

#[test]
fn test_copyright_scenario_bottom_right() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("landscape.png");
    write_source(&source, 1000, 800);

    let style = WatermarkStyle::new("© 2025")
        .with_font_size(64)
        .with_opacity(1.0)
        .with_stroke(2, [0, 0, 0, 255]);
    let layer = Arc::new(render_watermark(&style).unwrap());

    let anchor = Anchor::new(0.9, 0.9);
    let placement = anchor_placement((1000, 800), layer.dimensions(), anchor);
    assert_eq!(placement.x + (layer.width() / 2) as i64, 900);
    assert_eq!(placement.y + (layer.height() / 2) as i64, 720);

    let destination = dir.path().join("out/landscape_wm.png");
    let request = CompositionRequest::new(&source, &destination, layer.clone()).with_anchor(anchor);
    compose(&request).unwrap();

    let output = image::open(&destination).unwrap().to_rgba8();
    assert_eq!(output.dimensions(), (1000, 800));

    // Pixels near the anchor are changed, the far corner is not
    let original = image::open(&source).unwrap().to_rgba8();
    let changed_near_anchor = (850..950)
        .flat_map(|x| (700..740).map(move |y| (x, y)))
        .any(|(x, y)| output.get_pixel(x, y) != original.get_pixel(x, y));
    assert!(changed_near_anchor);
    assert_eq!(output.get_pixel(10, 10), original.get_pixel(10, 10));
}

#[test]
fn test_png_output_matches_resized_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("big.png");
    write_source(&source, 300, 200);

    let layer = Arc::new(render_watermark(&WatermarkStyle::new("r").with_font_size(12)).unwrap());
    let destination = dir.path().join("small.png");
    compose(&CompositionRequest::new(&source, &destination, layer).with_resize(120, 90)).unwrap();

    let output = image::open(&destination).unwrap();
    assert_eq!((output.width(), output.height()), (120, 90));
}

#[test]
fn test_cancelled_export_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir(&src).unwrap();
    let sources = make_sources(&src, 3);

    let out = dir.path().join("out");
    let exporter = Exporter::new(ExportConfig::new(&out));
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let outcomes = exporter
        .export_with_cancel(&sources, &WatermarkStyle::new("stop"), &cancel, |_| {})
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| !o.success));
    // Reserved placeholders are removed again
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
}
