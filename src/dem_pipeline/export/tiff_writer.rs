use std::io::Write;

use crate::dem_pipeline::common::{ElevationGrid, Result};

pub trait ElevationTiffWriter {
    fn write_tiff(&self, grid: &ElevationGrid, output: &mut dyn Write) -> Result<()>;
}
