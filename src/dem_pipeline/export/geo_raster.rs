//! `{job}_dem.tif`: georeferenced float raster, or a 16-bit grayscale
//! substitute when the georeferencing backend is unavailable.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::dem_pipeline::common::{DemError, ElevationGrid, Result};
use crate::dem_pipeline::export::encoder::ArtifactEncoder;
use crate::dem_pipeline::export::geotiff_writer::GeoTiffWriter;
use crate::dem_pipeline::export::gray16_tiff_writer::Gray16TiffWriter;
use crate::dem_pipeline::export::tiff_writer::ElevationTiffWriter;
use crate::dem_pipeline::export::types::{
    ArtifactKind, Capability, ExportConfig, JobTarget, OutputArtifact,
};

pub const GEO_RASTER_SUFFIX: &str = "_dem.tif";
pub const GEO_RASTER_KEY: &str = "dem_tiff";

pub struct GeoRasterEncoder {
    config: ExportConfig,
}

impl GeoRasterEncoder {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Encodes and flushes, so a failed final write surfaces as an error.
    fn write_output(
        writer: &dyn ElevationTiffWriter,
        grid: &ElevationGrid,
        output: &mut dyn Write,
        path: &Path,
    ) -> Result<()> {
        writer.write_tiff(grid, output)?;
        output
            .flush()
            .map_err(|e| DemError::OutputWriteError(format!("{}: {}", path.display(), e)))
    }

    fn write_file(writer: &dyn ElevationTiffWriter, grid: &ElevationGrid, path: &Path) -> Result<()> {
        let mut file = File::create(path)
            .map_err(|e| DemError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        Self::write_output(writer, grid, &mut file, path)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl ArtifactEncoder for GeoRasterEncoder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::GeoRaster
    }

    fn stage_message(&self) -> String {
        "Saving DEM as GeoTIFF...".to_string()
    }

    fn capability(&self) -> Capability {
        if !cfg!(feature = "geotiff") {
            Capability::Unsupported("built without the `geotiff` feature".to_string())
        } else if !self.config.georeferencing {
            Capability::Unsupported("georeferencing disabled in export config".to_string())
        } else {
            Capability::Supported
        }
    }

    fn encode(&self, grid: &ElevationGrid, target: &JobTarget) -> Result<Vec<OutputArtifact>> {
        let path = target.path(GEO_RASTER_SUFFIX);
        let writer = GeoTiffWriter {
            compression: self.config.compression,
        };
        Self::write_file(&writer, grid, &path)?;
        Ok(vec![OutputArtifact::new(ArtifactKind::GeoRaster, GEO_RASTER_KEY, path)])
    }

    fn fallback(
        &self,
        grid: &ElevationGrid,
        target: &JobTarget,
        cause: &DemError,
    ) -> Option<Result<Vec<OutputArtifact>>> {
        warn!("GeoTIFF unavailable ({}), writing 16-bit grayscale TIFF", cause);

        let path = target.path(GEO_RASTER_SUFFIX);
        let writer = Gray16TiffWriter {
            compression: self.config.compression,
            predictor: self.config.predictor,
        };
        let written = Self::write_file(&writer, grid, &path).map(|()| {
            vec![OutputArtifact::new(ArtifactKind::GeoRaster, GEO_RASTER_KEY, path).degraded()]
        });
        Some(written)
    }
}
