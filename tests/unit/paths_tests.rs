// Output path allocation

use inkstamp::export::{allocate, destination_for, reserve, Naming};
use inkstamp::image_io::OutputFormat;
use inkstamp::WatermarkError;
use std::path::{Path, PathBuf};

fn suffix_number(path: &Path, stem: &str) -> u64 {
    let name = path.file_stem().unwrap().to_string_lossy().into_owned();
    let rest = name.strip_prefix(stem).unwrap();
    if rest.is_empty() {
        0
    } else {
        rest.trim_start_matches('_').parse().unwrap()
    }
}

#[test]
fn test_repeated_allocation_strictly_increases() {
    let dir = tempfile::tempdir().unwrap();
    let mut last: Option<u64> = None;

    for _ in 0..5 {
        let path = allocate("photo", dir.path(), "", "_wm", ".png").unwrap();
        let n = suffix_number(&path, "photo_wm");
        if let Some(prev) = last {
            assert!(n > prev, "{} should be above {}", n, prev);
        }
        last = Some(n);
        std::fs::write(&path, b"taken").unwrap();
    }
    assert_eq!(last, Some(4));
}

#[test]
fn test_reserve_never_returns_existing_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("x.jpg"), b"old").unwrap();

    let reserved: Vec<PathBuf> = (0..3)
        .map(|_| reserve("x", dir.path(), "", "", "jpg").unwrap())
        .collect();

    assert_eq!(
        reserved,
        vec![
            dir.path().join("x_1.jpg"),
            dir.path().join("x_2.jpg"),
            dir.path().join("x_3.jpg"),
        ]
    );
    // The pre-existing file is untouched
    assert_eq!(std::fs::read(dir.path().join("x.jpg")).unwrap(), b"old");
}

#[test]
fn test_prefix_and_suffix_wrap_base_name() {
    let dir = tempfile::tempdir().unwrap();
    let naming = Naming::new("wm_", "_final");
    let path = destination_for(
        Path::new("/a/b/holiday.tiff"),
        dir.path(),
        &naming,
        OutputFormat::Png,
    )
    .unwrap();
    assert_eq!(path, dir.path().join("wm_holiday_final.png"));
}

#[test]
fn test_unreadable_output_dir() {
    let err = allocate("a", Path::new("/definitely/not/here"), "", "", ".png").unwrap_err();
    assert!(matches!(err, WatermarkError::PathAllocation { .. }));
    assert!(err.to_string().contains("/definitely/not/here"));
}
