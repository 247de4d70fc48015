//! Collision-free output paths.
//!
//! Output names follow `{prefix}{base}{suffix}{ext}`; when that file already
//! exists, `_1`, `_2`, ... is appended to the suffix until a free name is
//! found.
//!
//! [`allocate`] only checks for existence, so two callers racing on the same
//! name can both be handed it. [`reserve`] claims the name by creating an
//! empty file exclusively, which makes it safe to call concurrently.

use crate::error::{Result, WatermarkError};
use crate::image_io::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default suffix added after the source's base name.
pub const DEFAULT_SUFFIX: &str = "_wm";

/// Prefix and suffix wrapped around each output's base name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Naming {
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: default_suffix(),
        }
    }
}

impl Naming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Claim a destination for `source` in `output_dir` with [`reserve`].
    pub fn reserve_for(
        &self,
        source: &Path,
        output_dir: &Path,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        let base = base_name(source, output_dir)?;
        reserve(&base, output_dir, &self.prefix, &self.suffix, format.extension())
    }
}

/// Free destination for `source` in `output_dir`, checked with [`allocate`].
///
/// The base name is the source's file stem; the extension follows `format`.
pub fn destination_for(
    source: &Path,
    output_dir: &Path,
    naming: &Naming,
    format: OutputFormat,
) -> Result<PathBuf> {
    let base = base_name(source, output_dir)?;
    allocate(
        &base,
        output_dir,
        &naming.prefix,
        &naming.suffix,
        format.extension(),
    )
}

/// First non-existing `{prefix}{base}{suffix}[_n]{ext}` in `output_dir`.
///
/// `extension` may be given with or without the leading dot.
///
/// # Errors
///
/// [`WatermarkError::PathAllocation`] if `output_dir` is missing, is not a
/// directory, or a candidate cannot be inspected.
pub fn allocate(
    base_name: &str,
    output_dir: &Path,
    prefix: &str,
    suffix: &str,
    extension: &str,
) -> Result<PathBuf> {
    check_output_dir(output_dir)?;
    let extension = normalize_extension(extension);

    let mut attempt = 0u64;
    loop {
        let candidate = candidate_path(output_dir, base_name, prefix, suffix, &extension, attempt);
        let exists = candidate
            .try_exists()
            .map_err(|e| WatermarkError::path_allocation(output_dir, e))?;
        if !exists {
            return Ok(candidate);
        }
        attempt += 1;
    }
}

/// Like [`allocate`], but atomically claims the name by creating it as an
/// empty file. The caller is expected to overwrite it.
pub fn reserve(
    base_name: &str,
    output_dir: &Path,
    prefix: &str,
    suffix: &str,
    extension: &str,
) -> Result<PathBuf> {
    check_output_dir(output_dir)?;
    let extension = normalize_extension(extension);

    let mut attempt = 0u64;
    loop {
        let candidate = candidate_path(output_dir, base_name, prefix, suffix, &extension, attempt);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(WatermarkError::path_allocation(output_dir, e)),
        }
    }
}

fn check_output_dir(output_dir: &Path) -> Result<()> {
    let metadata = std::fs::metadata(output_dir)
        .map_err(|e| WatermarkError::path_allocation(output_dir, e))?;
    if !metadata.is_dir() {
        return Err(WatermarkError::path_allocation(
            output_dir,
            "not a directory",
        ));
    }
    Ok(())
}

fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}

fn candidate_path(
    output_dir: &Path,
    base_name: &str,
    prefix: &str,
    suffix: &str,
    extension: &str,
    attempt: u64,
) -> PathBuf {
    let name = if attempt == 0 {
        format!("{}{}{}{}", prefix, base_name, suffix, extension)
    } else {
        format!("{}{}{}_{}{}", prefix, base_name, suffix, attempt, extension)
    };
    output_dir.join(name)
}

fn base_name(source: &Path, output_dir: &Path) -> Result<String> {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| {
            WatermarkError::path_allocation(
                output_dir,
                format!("source {} has no file name", source.display()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_free_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = allocate("photo", dir.path(), "wm_", "_out", ".png").unwrap();
        assert_eq!(path, dir.path().join("wm_photo_out.png"));
    }

    #[test]
    fn test_allocate_accepts_extension_without_dot() {
        let dir = tempfile::tempdir().unwrap();
        let path = allocate("photo", dir.path(), "", "", "jpg").unwrap();
        assert_eq!(path, dir.path().join("photo.jpg"));
    }

    #[test]
    fn test_allocate_appends_counter_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_wm.png"), b"").unwrap();
        std::fs::write(dir.path().join("a_wm_1.png"), b"").unwrap();

        let path = allocate("a", dir.path(), "", "_wm", ".png").unwrap();
        assert_eq!(path, dir.path().join("a_wm_2.png"));
    }

    #[test]
    fn test_allocate_does_not_create_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = allocate("a", dir.path(), "", "", ".png").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_allocate_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = allocate("a", &missing, "", "", ".png").unwrap_err();
        assert!(matches!(err, WatermarkError::PathAllocation { .. }));
    }

    #[test]
    fn test_allocate_rejects_file_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(allocate("a", &file, "", "", ".png").is_err());
    }

    #[test]
    fn test_reserve_claims_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let first = reserve("img", dir.path(), "", "_wm", "png").unwrap();
        let second = reserve("img", dir.path(), "", "_wm", "png").unwrap();

        assert_eq!(first, dir.path().join("img_wm.png"));
        assert_eq!(second, dir.path().join("img_wm_1.png"));
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn test_reserve_concurrently_never_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| reserve("same", dir.path(), "", "", ".png").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let unique: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn test_destination_for_uses_stem_and_format() {
        let dir = tempfile::tempdir().unwrap();
        let naming = Naming::default();
        let path = destination_for(
            Path::new("/photos/IMG_0042.JPG"),
            dir.path(),
            &naming,
            OutputFormat::Jpeg,
        )
        .unwrap();
        assert_eq!(path, dir.path().join("IMG_0042_wm.jpg"));

        let reserved = naming
            .reserve_for(Path::new("/photos/IMG_0042.JPG"), dir.path(), OutputFormat::Png)
            .unwrap();
        assert_eq!(reserved, dir.path().join("IMG_0042_wm.png"));
    }
}
