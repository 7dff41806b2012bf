use std::path::Path;

use crate::dem_pipeline::common::{IntensityGrid, Result};

/// Raster formats accepted as pipeline input.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif"];

pub trait IntensityReader {
    fn read_intensity(&self, data: &[u8]) -> Result<IntensityGrid>;
}

/// Extension check against [`SUPPORTED_EXTENSIONS`], case-insensitive.
pub fn is_supported_input<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
