//! Watermark style parameters.
//!
//! A [`WatermarkStyle`] fully describes how a text watermark looks. It is
//! built once per render request and never mutated afterwards.
//!
//! ```yaml
//! watermark:
//!   text: "© 2025 Studio"
//!   font_size: 48
//!   color: "#FFFFFF"
//!   opacity: 0.8
//!   stroke_width: 2
//!   stroke_color: [0, 0, 0, 255]
//!   shadow_offset: [3, 3]
//!   shadow_blur_radius: 2.5
//!   italic: true
//! ```

use crate::error::{Result, WatermarkError};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_font_size() -> u32 {
    64
}

fn default_opacity() -> f32 {
    0.5
}

fn default_stroke_width() -> u32 {
    2
}

fn default_stroke_color() -> [u8; 4] {
    [0, 0, 0, 255]
}

fn default_shadow_offset() -> (i32, i32) {
    (2, 2)
}

fn default_shadow_blur_radius() -> f32 {
    4.0
}

/// RGB text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Color as `#RRGGBB`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Color with the given alpha as an RGBA pixel.
    pub fn with_alpha(&self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

impl TryFrom<String> for Color {
    type Error = WatermarkError;

    fn try_from(value: String) -> Result<Self> {
        parse_hex_color(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```
/// use inkstamp::watermark::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FFF").unwrap(), Color::new(255, 255, 255));
/// assert_eq!(parse_hex_color("#FF0000").unwrap(), Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::InvalidStyle("Color must start with '#'".to_string()))?;

    if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(WatermarkError::InvalidStyle(format!(
            "Invalid hex digit '{}' in color",
            bad
        )));
    }

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::InvalidStyle(format!("Invalid hex digit in '{}'", s)))
    };

    match hex.len() {
        // #RGB: each digit is doubled, 0xA -> 0xAA
        3 => Ok(Color::new(
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(WatermarkError::InvalidStyle(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

/// Everything needed to render one text watermark layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkStyle {
    /// Text to render. Line breaks start new lines.
    pub text: String,

    /// TrueType/OpenType font file. `None` uses the embedded default face.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Font size in pixels (default: 64)
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Fill color (default: "#FFFFFF")
    #[serde(default)]
    pub color: Color,

    /// Fill opacity from 0.0 to 1.0 (default: 0.5)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Outline width in pixels, 0 disables the outline (default: 2)
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,

    /// Outline color, also used for the shadow (default: opaque black)
    #[serde(default = "default_stroke_color")]
    pub stroke_color: [u8; 4],

    /// Shadow displacement in pixels (default: [2, 2])
    #[serde(default = "default_shadow_offset")]
    pub shadow_offset: (i32, i32),

    /// Shadow blur radius, 0 disables the shadow (default: 4.0)
    #[serde(default = "default_shadow_blur_radius")]
    pub shadow_blur_radius: f32,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    /// Counter-clockwise rotation in degrees
    #[serde(default)]
    pub rotation_degrees: f32,
}

impl WatermarkStyle {
    /// Create a style for `text` with default parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_path: None,
            font_size: default_font_size(),
            color: Color::white(),
            opacity: default_opacity(),
            stroke_width: default_stroke_width(),
            stroke_color: default_stroke_color(),
            shadow_offset: default_shadow_offset(),
            shadow_blur_radius: default_shadow_blur_radius(),
            bold: false,
            italic: false,
            rotation_degrees: 0.0,
        }
    }

    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the outline width and color.
    pub fn with_stroke(mut self, width: u32, color: [u8; 4]) -> Self {
        self.stroke_width = width;
        self.stroke_color = color;
        self
    }

    /// Set the shadow offset and blur radius.
    pub fn with_shadow(mut self, offset: (i32, i32), blur_radius: f32) -> Self {
        self.shadow_offset = offset;
        self.shadow_blur_radius = blur_radius;
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    /// Alpha of the glyph fill, `round(255 * opacity)`.
    pub fn fill_alpha(&self) -> u8 {
        (255.0 * self.opacity.clamp(0.0, 1.0)).round() as u8
    }

    pub fn fill_rgba(&self) -> Rgba<u8> {
        self.color.with_alpha(self.fill_alpha())
    }

    pub fn stroke_rgba(&self) -> Rgba<u8> {
        Rgba(self.stroke_color)
    }

    /// Rotation folded into [0, 360).
    pub fn normalized_rotation(&self) -> f32 {
        self.rotation_degrees.rem_euclid(360.0)
    }

    /// Check parameters that would make rendering meaningless.
    ///
    /// Empty text is reported separately by the renderer as
    /// [`WatermarkError::EmptyText`].
    pub fn validate(&self) -> Result<()> {
        if self.font_size == 0 {
            return Err(WatermarkError::InvalidStyle(
                "font_size must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(WatermarkError::InvalidStyle(format!(
                "opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            )));
        }
        if !self.shadow_blur_radius.is_finite() || self.shadow_blur_radius < 0.0 {
            return Err(WatermarkError::InvalidStyle(format!(
                "shadow_blur_radius must be a non-negative number, got {}",
                self.shadow_blur_radius
            )));
        }
        if !self.rotation_degrees.is_finite() {
            return Err(WatermarkError::InvalidStyle(
                "rotation_degrees must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
