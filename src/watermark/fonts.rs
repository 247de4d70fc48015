//! Font loading.
//!
//! The default face (DejaVu Sans Mono) is embedded in the binary so text can
//! always be rendered. Font files are read once and cached by path.

use crate::error::{Result, WatermarkError};
use ab_glyph::{FontArc, FontRef};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Embedded font data (DejaVu Sans Mono, Bitstream Vera license).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

static DEFAULT_FONT: OnceLock<FontArc> = OnceLock::new();

static FONT_CACHE: OnceLock<RwLock<HashMap<PathBuf, FontArc>>> = OnceLock::new();

/// Get the embedded default font, parsing it on first use.
pub fn default_font() -> Result<FontArc> {
    if let Some(font) = DEFAULT_FONT.get() {
        return Ok(font.clone());
    }

    let font = FontRef::try_from_slice(EMBEDDED_FONT_DATA).map_err(|e| WatermarkError::FontLoad {
        path: PathBuf::from("<embedded>"),
        message: e.to_string(),
    })?;
    // Concurrent first calls may both parse; the first stored wins
    Ok(DEFAULT_FONT.get_or_init(|| FontArc::new(font)).clone())
}

/// Load the font for `path`, or the embedded default when `path` is `None`.
pub fn load_font(path: Option<&Path>) -> Result<FontArc> {
    match path {
        None => default_font(),
        Some(path) => load_font_file(path),
    }
}

fn load_font_file(path: &Path) -> Result<FontArc> {
    let cache = FONT_CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    if let Some(font) = cache.read().get(path) {
        return Ok(font.clone());
    }

    let data = std::fs::read(path).map_err(|e| WatermarkError::FontLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let font = FontArc::try_from_vec(data).map_err(|e| WatermarkError::FontLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    tracing::debug!(font = %path.display(), "Loaded font file");

    cache.write().insert(path.to_path_buf(), font.clone());
    Ok(font)
}
