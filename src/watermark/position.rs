//! Anchor-based placement of a watermark layer on a target image.
//!
//! An [`Anchor`] is a pair of fractions of the target's width and height.
//! The layer is centered on the anchored point; it is never clamped, so a
//! layer anchored near an edge may hang partly (or entirely) outside.
//!
//! ```
//! use inkstamp::watermark::{anchor_placement, Anchor};
//!
//! // 1000x800 image, 200x50 layer, anchored at 90%/90%
//! let placement = anchor_placement((1000, 800), (200, 50), Anchor::new(0.9, 0.9));
//! assert_eq!((placement.x, placement.y), (800, 695));
//! ```

use crate::error::{Result, WatermarkError};
use serde::{Deserialize, Serialize};

/// Fractional anchor point, each coordinate in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub const CENTER: Anchor = Anchor { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Map a named 9-grid position to an anchor.
    ///
    /// Edges sit at 10% / 90% rather than 0 / 1 so the watermark stays
    /// inside the image. Both the snake_case names and the Chinese labels
    /// stored by the desktop template editor (`左上` .. `右下`) are accepted.
    pub fn from_position_name(name: &str) -> Result<Self> {
        const NEAR: f64 = 0.1;
        const MID: f64 = 0.5;
        const FAR: f64 = 0.9;

        let anchor = match name.trim().to_ascii_lowercase().as_str() {
            "top_left" | "左上" => Self::new(NEAR, NEAR),
            "top_center" | "top" | "正上" => Self::new(MID, NEAR),
            "top_right" | "右上" => Self::new(FAR, NEAR),
            "center_left" | "left" | "左中" => Self::new(NEAR, MID),
            "center" | "中心" => Self::CENTER,
            "center_right" | "right" | "右中" => Self::new(FAR, MID),
            "bottom_left" | "左下" => Self::new(NEAR, FAR),
            "bottom_center" | "bottom" | "正下" => Self::new(MID, FAR),
            "bottom_right" | "右下" => Self::new(FAR, FAR),
            other => {
                return Err(WatermarkError::Template(format!(
                    "Unknown position '{}'",
                    other
                )))
            }
        };
        Ok(anchor)
    }

    pub fn validate(&self) -> Result<()> {
        for (axis, value) in [("x", self.x), ("y", self.y)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(WatermarkError::Config(format!(
                    "anchor.{} must be between 0.0 and 1.0, got {}",
                    axis, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Top-left corner of a placed layer. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
}

/// Where the top-left corner of a `layer`-sized watermark lands when its
/// center is put on `anchor` of an `image`-sized target.
pub fn anchor_placement(image: (u32, u32), layer: (u32, u32), anchor: Anchor) -> Placement {
    let (img_w, img_h) = image;
    let (layer_w, layer_h) = layer;

    // Truncation toward zero, as for any non-negative fraction
    let center_x = (anchor.x * img_w as f64) as i64;
    let center_y = (anchor.y * img_h as f64) as i64;

    Placement {
        x: center_x - (layer_w / 2) as i64,
        y: center_y - (layer_h / 2) as i64,
    }
}
