//! Saved watermark templates.
//!
//! Templates are stored externally as JSON records. This module only decodes
//! them and turns a record into a [`WatermarkStyle`] plus an [`Anchor`];
//! reading and writing the store is up to the caller.
//!
//! ```json
//! {
//!   "templates": {
//!     "default": {
//!       "text": "Copyright",
//!       "font_size": 40,
//!       "color": [255, 255, 255, 200],
//!       "position": "bottom_right",
//!       "opacity": 0.8,
//!       "rotate": 0,
//!       "show_blur": 2,
//!       "stroke_fill": [0, 0, 0, 255]
//!     }
//!   },
//!   "last_used": "default"
//! }
//! ```

use super::position::Anchor;
use super::style::{Color, WatermarkStyle};
use crate::error::{Result, WatermarkError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_text() -> String {
    "Copyright".to_string()
}

fn default_font_size() -> u32 {
    40
}

fn default_color() -> [u8; 4] {
    [255, 255, 255, 200]
}

fn default_position() -> String {
    "bottom_right".to_string()
}

fn default_opacity() -> f32 {
    0.8
}

fn default_show_blur() -> f32 {
    2.0
}

fn default_stroke_fill() -> [u8; 4] {
    [0, 0, 0, 255]
}

/// One stored template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    #[serde(default = "default_text")]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// `[r, g, b, a]`; only RGB is used, the fill alpha comes from `opacity`
    #[serde(default = "default_color")]
    pub color: [u8; 4],

    /// 9-grid position name, see [`Anchor::from_position_name`]
    #[serde(default = "default_position")]
    pub position: String,

    #[serde(default = "default_opacity")]
    pub opacity: f32,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    /// Rotation in degrees
    #[serde(default)]
    pub rotate: f32,

    /// Shadow blur radius
    #[serde(default = "default_show_blur")]
    pub show_blur: f32,

    /// Outline and shadow color
    #[serde(default = "default_stroke_fill")]
    pub stroke_fill: [u8; 4],
}

impl Default for TemplateRecord {
    fn default() -> Self {
        Self {
            text: default_text(),
            font_path: None,
            font_size: default_font_size(),
            color: default_color(),
            position: default_position(),
            opacity: default_opacity(),
            bold: false,
            italic: false,
            rotate: 0.0,
            show_blur: default_show_blur(),
            stroke_fill: default_stroke_fill(),
        }
    }
}

impl TemplateRecord {
    /// Parse a single JSON record.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WatermarkError::Template(e.to_string()))
    }

    /// Style described by this record.
    ///
    /// Exports draw no outline (stroke width 0) and drop the shadow by (2, 2).
    pub fn to_style(&self) -> WatermarkStyle {
        let [r, g, b, _] = self.color;
        let mut style = WatermarkStyle::new(self.text.clone())
            .with_font_size(self.font_size)
            .with_color(Color::new(r, g, b))
            .with_opacity(self.opacity)
            .with_stroke(0, self.stroke_fill)
            .with_shadow((2, 2), self.show_blur)
            .with_bold(self.bold)
            .with_italic(self.italic)
            .with_rotation(self.rotate);
        if let Some(path) = &self.font_path {
            style = style.with_font_path(path);
        }
        style
    }

    pub fn anchor(&self) -> Result<Anchor> {
        Anchor::from_position_name(&self.position)
    }
}

/// The whole template store: named records plus the last one used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateMap {
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateRecord>,
    #[serde(default)]
    pub last_used: Option<String>,
}

impl TemplateMap {
    /// Record named by `last_used`, if it still exists.
    pub fn last_used_record(&self) -> Option<&TemplateRecord> {
        self.last_used
            .as_ref()
            .and_then(|name| self.templates.get(name))
    }
}

/// Parse a `{ "templates": {...}, "last_used": name }` document.
pub fn parse_template_map(json: &str) -> Result<TemplateMap> {
    serde_json::from_str(json).map_err(|e| WatermarkError::Template(e.to_string()))
}
