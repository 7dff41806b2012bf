use std::io::Write;
use tracing::debug;

use crate::dem_pipeline::common::{DemError, ElevationGrid, Result};
use crate::dem_pipeline::export::tiff_writer::ElevationTiffWriter;
use crate::dem_pipeline::export::types::TiffCompression;

/// Plain single-band 16-bit TIFF, values rescaled to `[0, 65535]`.
///
/// Carries no georeferencing; used when the GeoTIFF backend is unavailable.
pub struct Gray16TiffWriter {
    pub compression: TiffCompression,
    pub predictor: Option<u16>,
}

impl Gray16TiffWriter {
    pub fn scaled_samples(grid: &ElevationGrid) -> Vec<u16> {
        grid.normalized()
            .iter()
            .map(|&t| (t * u16::MAX as f64) as u16)
            .collect()
    }
}

impl ElevationTiffWriter for Gray16TiffWriter {
    fn write_tiff(&self, grid: &ElevationGrid, output: &mut dyn Write) -> Result<()> {
        debug!("Encoding 16-bit TIFF: {}x{}", grid.width(), grid.height());

        let samples = Self::scaled_samples(grid);
        let mut buffer = Vec::new();

        let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| DemError::EncodeError(e.to_string()))?
            .with_compression(self.compression.to_tiff());

        if let Some(predictor_val) = self.predictor {
            let predictor = match predictor_val {
                2 => tiff::tags::Predictor::Horizontal,
                _ => tiff::tags::Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        encoder
            .write_image::<tiff::encoder::colortype::Gray16>(
                grid.width() as u32,
                grid.height() as u32,
                &samples,
            )
            .map_err(|e| DemError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("16-bit TIFF encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tiff::decoder::{Decoder, DecodingResult};

    #[test]
    fn test_rescales_to_full_u16_range() {
        let grid = ElevationGrid::new(array![[0.0, 5.0], [10.0, 2.5]]).unwrap();
        assert_eq!(Gray16TiffWriter::scaled_samples(&grid), vec![0, 32767, 65535, 16383]);
    }

    #[test]
    fn test_written_tiff_decodes() {
        let grid = ElevationGrid::new(array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]).unwrap();
        let writer = Gray16TiffWriter {
            compression: TiffCompression::Lzw,
            predictor: Some(2),
        };
        let mut out = Vec::new();
        writer.write_tiff(&grid, &mut out).unwrap();

        let mut decoder = Decoder::new(std::io::Cursor::new(out)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (3, 2));
        match decoder.read_image().unwrap() {
            DecodingResult::U16(samples) => {
                assert_eq!(samples[0], 0);
                assert_eq!(samples[5], 65535);
            }
            _ => panic!("expected 16-bit samples"),
        }
    }
}
