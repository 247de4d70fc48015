//! Error types for watermark rendering, compositing and export.
//!
//! Rendering and compositing errors propagate to the caller as-is. The batch
//! executor is the only place that turns them into per-job failure messages.

use std::path::PathBuf;

/// Errors that can occur while rendering, compositing or exporting watermarks.
#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    /// Font file could not be opened or parsed
    #[error("Failed to load font {path}: {message}")]
    FontLoad { path: PathBuf, message: String },

    /// Watermark text is empty after trimming
    #[error("Watermark text is empty")]
    EmptyText,

    /// Style parameters cannot be rendered
    #[error("Invalid watermark style: {0}")]
    InvalidStyle(String),

    /// Source image could not be read or decoded
    #[error("Failed to decode {path}: {message}")]
    SourceDecode { path: PathBuf, message: String },

    /// Output format is neither PNG nor JPEG
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Resampling the source to the requested size failed
    #[error("Failed to resize image: {0}")]
    Resize(String),

    /// Encoding the composited image failed
    #[error("Failed to encode to {format}: {message}")]
    Encode { format: &'static str, message: String },

    /// A destination path could not be derived
    #[error("Failed to allocate output path in {dir}: {message}")]
    PathAllocation { dir: PathBuf, message: String },

    /// Write or filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or executor setup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template record could not be parsed
    #[error("Template error: {0}")]
    Template(String),
}

impl WatermarkError {
    /// Stable category name for structured logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::FontLoad { .. } => "font_load",
            Self::EmptyText => "empty_text",
            Self::InvalidStyle(_) => "invalid_style",
            Self::SourceDecode { .. } => "source_decode",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Resize(_) => "resize",
            Self::Encode { .. } => "encode",
            Self::PathAllocation { .. } => "path_allocation",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
            Self::Template(_) => "template",
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::SourceDecode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn encode(format: &'static str, message: impl ToString) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }

    pub(crate) fn path_allocation(dir: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::PathAllocation {
            dir: dir.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, WatermarkError>;
