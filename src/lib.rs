// Inkstamp: text watermark rendering, compositing and batch export

pub mod config;
pub mod error;
pub mod export;
pub mod image_io;
pub mod logging;
pub mod watermark;

pub use error::{Result, WatermarkError};
