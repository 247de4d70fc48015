//! Image input and output.
//!
//! - Decoding with EXIF orientation correction (JPEG, PNG, BMP, TIFF, ...)
//! - Exact-size Lanczos3 resampling
//! - PNG and JPEG encoders behind the [`ImageEncoder`] trait
//! - Bounded thumbnails for previews

pub mod decode;
pub mod encoder;
pub mod format;
#[cfg(feature = "mozjpeg")]
mod mozjpeg;
pub mod resize;

pub use decode::{apply_orientation, decode_bytes, decode_file, exif_orientation};
pub use encoder::{encoder_for, ImageEncoder, JpegEncoder, PngEncoder, DEFAULT_JPEG_QUALITY};
pub use format::{is_supported_source, OutputFormat, SOURCE_EXTENSIONS};
pub use resize::{resize_exact, thumbnail, thumbnail_file, DEFAULT_THUMBNAIL_SIZE};
