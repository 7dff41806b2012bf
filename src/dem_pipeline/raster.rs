//! Raster loading module
//!
//! This module decodes input images into single-channel intensity grids and
//! applies the adaptive contrast normalization consumed by the estimator.

mod reader;
mod image_reader;
mod clahe;

pub use reader::{IntensityReader, is_supported_input, SUPPORTED_EXTENSIONS};
pub use image_reader::ImageCrateReader;
pub use clahe::ContrastEnhancer;
