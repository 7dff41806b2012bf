//! Intensity reader backed by the `image` crate.
//!
//! Handles every format enabled on the `image` dependency (PNG, JPEG, TIFF).
//! Color inputs are reduced to luminance with the ITU-R BT.601 weights; single
//! channel inputs are passed through at 8 bits.

use image::DynamicImage;
use tracing::debug;

use crate::dem_pipeline::common::error::{DemError, Result};
use crate::dem_pipeline::common::grid::IntensityGrid;
use crate::dem_pipeline::raster::reader::IntensityReader;

/// Decodes any raster the `image` crate understands into an [`IntensityGrid`].
pub struct ImageCrateReader;

const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

fn luminance(rgb: [u8; 3]) -> u8 {
    let y = LUMA_WEIGHTS[0] * rgb[0] as f32
        + LUMA_WEIGHTS[1] * rgb[1] as f32
        + LUMA_WEIGHTS[2] * rgb[2] as f32;
    y.round().clamp(0.0, 255.0) as u8
}

impl ImageCrateReader {
    fn reduce_channels(decoded: DynamicImage) -> Vec<u8> {
        if decoded.color().channel_count() >= 3 {
            decoded
                .to_rgb8()
                .pixels()
                .map(|pixel| luminance(pixel.0))
                .collect()
        } else {
            decoded.to_luma8().into_raw()
        }
    }
}

impl IntensityReader for ImageCrateReader {
    fn read_intensity(&self, data: &[u8]) -> Result<IntensityGrid> {
        debug!("Decoding input image, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| DemError::DecodeError(e.to_string()))?;

        let width = decoded.width() as usize;
        let height = decoded.height() as usize;
        if width == 0 || height == 0 {
            return Err(DemError::DecodeError(format!(
                "image has zero area ({}x{})",
                width, height
            )));
        }

        debug!(
            "Decoded image: {}x{}, color type {:?}",
            width,
            height,
            decoded.color()
        );

        let samples = Self::reduce_channels(decoded);
        IntensityGrid::from_raw(width, height, samples)
    }
}
