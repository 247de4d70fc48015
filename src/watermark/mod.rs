//! Text watermark rendering and compositing.
//!
//! A [`WatermarkStyle`] is rendered once into an RGBA [`RasterLayer`], which
//! is then composited onto any number of source images.
//!
//! # Features
//!
//! - **Anti-aliased text** with outline, blurred drop shadow and multi-line
//!   layout, using an embedded default face or any TrueType/OpenType file
//! - **Synthetic bold and italic** for faces without those variants
//! - **Rotation** with canvas expansion
//! - **Anchor placement** by fractional coordinates or 9-grid names
//! - **Templates** decoded from stored JSON records
//!
//! # Example
//!
//! ```yaml
//! watermark:
//!   text: "© 2025"
//!   font_size: 64
//!   opacity: 1.0
//!   stroke_width: 2
//!   rotation_degrees: 30
//! ```

pub mod compositor;
pub mod fonts;
pub mod position;
pub mod style;
pub mod template;
pub mod text_renderer;
pub mod transform;

pub use compositor::{compose, compose_image, paste_with_mask, CompositionRequest};
pub use fonts::{default_font, load_font};
pub use position::{anchor_placement, Anchor, Placement};
pub use style::{parse_hex_color, Color, WatermarkStyle};
pub use template::{parse_template_map, TemplateMap, TemplateRecord};
pub use text_renderer::{measure_text, render_watermark, RasterLayer};

pub use crate::image_io::OutputFormat;
