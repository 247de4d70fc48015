// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WatermarkError};
use crate::export::paths::{Naming, DEFAULT_SUFFIX};
use crate::image_io::{OutputFormat, DEFAULT_JPEG_QUALITY};
use crate::watermark::{Anchor, WatermarkStyle};

/// Batch export settings.
///
/// ```yaml
/// output_dir: ${EXPORT_DIR}/watermarked
/// prefix: "wm_"
/// suffix: ""
/// output_format: jpeg
/// jpeg_quality: 85
/// max_concurrency: 4
/// resize:
///   width: 1920
///   height: 1080
/// anchor:
///   x: 0.9
///   y: 0.9
/// watermark:
///   text: "© 2025"
///   font_size: 64
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeConfig>,
    #[serde(default)]
    pub anchor: Anchor,
    /// Allow writing results next to their sources
    #[serde(default)]
    pub allow_source_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkStyle>,
}

/// Exact output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeConfig {
    pub width: u32,
    pub height: u32,
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_max_concurrency() -> usize {
    crate::export::batch::DEFAULT_MAX_CONCURRENCY
}

impl ExportConfig {
    /// Config writing to `output_dir` with every other setting at its default.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: String::new(),
            suffix: default_suffix(),
            output_format: OutputFormat::default(),
            jpeg_quality: default_jpeg_quality(),
            max_concurrency: default_max_concurrency(),
            resize: None,
            anchor: Anchor::default(),
            allow_source_dir: false,
            watermark: None,
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| WatermarkError::Config(e.to_string()))
    }

    /// Parse YAML after replacing `${VAR_NAME}` with environment variables.
    ///
    /// Fails if a referenced variable is not set.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| WatermarkError::Config(e.to_string()))?;

        let mut missing: Option<String> = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            match std::env::var(&caps[1]) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            }
        });

        if let Some(var_name) = missing {
            return Err(WatermarkError::Config(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            )));
        }

        Self::from_yaml(&substituted)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| WatermarkError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(WatermarkError::Config(
                "output_dir cannot be empty".to_string(),
            ));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(WatermarkError::Config(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }

        if self.max_concurrency == 0 {
            return Err(WatermarkError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(resize) = &self.resize {
            if resize.width == 0 || resize.height == 0 {
                return Err(WatermarkError::Config(format!(
                    "resize dimensions must be greater than 0, got {}x{}",
                    resize.width, resize.height
                )));
            }
        }

        self.anchor.validate()?;

        if let Some(style) = &self.watermark {
            style
                .validate()
                .map_err(|e| WatermarkError::Config(format!("watermark: {}", e)))?;
        }

        Ok(())
    }

    pub fn naming(&self) -> Naming {
        Naming::new(self.prefix.clone(), self.suffix.clone())
    }

    pub fn resize_target(&self) -> Option<(u32, u32)> {
        self.resize.map(|r| (r.width, r.height))
    }
}
