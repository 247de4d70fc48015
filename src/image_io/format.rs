//! Output formats and recognised source file types.

use crate::error::WatermarkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Extensions (lowercase, no dot) accepted as watermark sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    /// Lossless, keeps alpha
    #[default]
    Png,
    /// Lossy, alpha dropped
    Jpeg,
}

impl OutputFormat {
    /// Lowercase format name, as used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
        }
    }

    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => ".png",
            OutputFormat::Jpeg => ".jpg",
        }
    }

    pub fn supports_transparency(&self) -> bool {
        matches!(self, OutputFormat::Png)
    }

    /// Pick the format from a file path's extension.
    pub fn from_extension(path: &Path) -> Result<Self, WatermarkError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| WatermarkError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }
}

impl FromStr for OutputFormat {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            _ => Err(WatermarkError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = WatermarkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.name().to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `path` has one of the [`SOURCE_EXTENSIONS`], ignoring case.
pub fn is_supported_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SOURCE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
