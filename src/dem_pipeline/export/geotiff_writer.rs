//! Georeferenced float TIFF writer.
//!
//! Writes the grid as single-band 64-bit float with the GeoTIFF tags that map
//! pixel `(0, 0)-(W, H)` onto world bounds `(0, 0)-(W, H)` in WGS84
//! (EPSG:4326). North is up: the top-left pixel corner sits at world `(0, H)`.

use std::io::{Cursor, Write};

use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::Gray64Float;
use tiff::tags::Tag;
use tracing::debug;

use crate::dem_pipeline::common::{DemError, ElevationGrid, Result};
use crate::dem_pipeline::export::tiff_writer::ElevationTiffWriter;
use crate::dem_pipeline::export::types::TiffCompression;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const EPSG_WGS84: u16 = 4326;

pub const NODATA_VALUE: &str = "-9999";

/// Pixel-to-world mapping of the bounds `(0, 0)-(W, H)` onto a `W x H` raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityGeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl IdentityGeoTransform {
    pub fn for_grid(grid: &ElevationGrid) -> Self {
        let (height, width) = grid.dim();
        let (west, south, east, north) = (0.0, 0.0, width as f64, height as f64);
        Self {
            origin_x: west,
            origin_y: north,
            pixel_width: (east - west) / width as f64,
            pixel_height: -(north - south) / height as f64,
        }
    }

    /// World coordinate of a pixel corner.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }
}

pub struct GeoTiffWriter {
    pub compression: TiffCompression,
}

impl GeoTiffWriter {
    fn geo_keys() -> Vec<u16> {
        vec![
            1, 1, 0, 3, // version 1.1.0, 3 keys
            1024, 0, 1, MODEL_TYPE_GEOGRAPHIC, // GTModelTypeGeoKey
            1025, 0, 1, RASTER_PIXEL_IS_AREA, // GTRasterTypeGeoKey
            2048, 0, 1, EPSG_WGS84, // GeographicTypeGeoKey
        ]
    }
}

impl ElevationTiffWriter for GeoTiffWriter {
    fn write_tiff(&self, grid: &ElevationGrid, output: &mut dyn Write) -> Result<()> {
        debug!("Encoding GeoTIFF: {}x{}", grid.width(), grid.height());

        let transform = IdentityGeoTransform::for_grid(grid);
        let samples: Vec<f64> = grid.view().iter().copied().collect();
        let encode_err = |e: tiff::TiffError| DemError::EncodeError(e.to_string());

        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
                .map_err(encode_err)?
                .with_compression(self.compression.to_tiff());

            let mut image = encoder
                .new_image::<Gray64Float>(grid.width() as u32, grid.height() as u32)
                .map_err(encode_err)?;

            let scale = [transform.pixel_width, transform.pixel_height.abs(), 0.0];
            image
                .encoder()
                .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
                .map_err(encode_err)?;

            let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];
            image
                .encoder()
                .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
                .map_err(encode_err)?;

            let geo_keys = Self::geo_keys();
            image
                .encoder()
                .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geo_keys[..])
                .map_err(encode_err)?;

            image
                .encoder()
                .write_tag(Tag::Unknown(GDAL_NODATA), NODATA_VALUE)
                .map_err(encode_err)?;

            image.write_data(&samples).map_err(encode_err)?;
        }

        output.write_all(&buffer)?;

        debug!("GeoTIFF encoding complete");
        Ok(())
    }
}
