//! Colorized and grayscale PNG renderings of the elevation grid.
//!
//! Writes three files per job: a side-by-side composite (terrain ramp next to
//! grayscale, each with a color bar), a single terrain "top view", and a plain
//! 8-bit grayscale image. Row 0 of the grid is the top row of every image.

use std::fs;
use std::path::PathBuf;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use ndarray::ArrayView2;
use tracing::{debug, warn};

use crate::dem_pipeline::common::{DemError, ElevationGrid, Result};
use crate::dem_pipeline::export::colormap::{self, ColorStop};
use crate::dem_pipeline::export::encoder::ArtifactEncoder;
use crate::dem_pipeline::export::types::{ArtifactKind, JobTarget, OutputArtifact};

pub const COMPOSITE_SUFFIX: &str = "_dem_image.png";
pub const TOP_VIEW_SUFFIX: &str = "_dem_image_topview.png";
pub const GRAYSCALE_SUFFIX: &str = "_dem_image_grayscale.png";

const MARGIN: u32 = 16;
const BAR_GAP: u32 = 8;
const BAR_WIDTH: u32 = 16;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

pub struct ColorRasterEncoder;

impl ColorRasterEncoder {
    fn panel_width(grid_width: u32) -> u32 {
        grid_width + BAR_GAP + BAR_WIDTH
    }

    /// Paints one ramp-colored panel plus its vertical color bar at `(x0, y0)`.
    fn paint_panel(canvas: &mut RgbImage, x0: u32, y0: u32, normalized: ArrayView2<'_, f64>, ramp: &[ColorStop]) {
        let (rows, cols) = normalized.dim();
        for ((r, c), &t) in normalized.indexed_iter() {
            canvas.put_pixel(x0 + c as u32, y0 + r as u32, colormap::evaluate(ramp, t));
        }

        let bar_x = x0 + cols as u32 + BAR_GAP;
        for r in 0..rows as u32 {
            // Top of the bar is the highest elevation.
            let t = if rows > 1 {
                1.0 - r as f64 / (rows - 1) as f64
            } else {
                1.0
            };
            let color = colormap::evaluate(ramp, t);
            for dx in 0..BAR_WIDTH {
                canvas.put_pixel(bar_x + dx, y0 + r, color);
            }
        }
    }

    pub fn render_composite(grid: &ElevationGrid) -> RgbImage {
        let normalized = grid.normalized();
        let (w, h) = (grid.width() as u32, grid.height() as u32);
        let panel = Self::panel_width(w);

        let mut canvas = ImageBuffer::from_pixel(3 * MARGIN + 2 * panel, 2 * MARGIN + h, BACKGROUND);
        Self::paint_panel(&mut canvas, MARGIN, MARGIN, normalized.view(), colormap::TERRAIN);
        Self::paint_panel(
            &mut canvas,
            2 * MARGIN + panel,
            MARGIN,
            normalized.view(),
            colormap::GRAYSCALE,
        );
        canvas
    }

    pub fn render_top_view(grid: &ElevationGrid) -> RgbImage {
        let normalized = grid.normalized();
        let (w, h) = (grid.width() as u32, grid.height() as u32);

        let mut canvas =
            ImageBuffer::from_pixel(2 * MARGIN + Self::panel_width(w), 2 * MARGIN + h, BACKGROUND);
        Self::paint_panel(&mut canvas, MARGIN, MARGIN, normalized.view(), colormap::TERRAIN);
        canvas
    }

    /// Linear rescale to `[0, 255]`, truncating. A flat grid renders black.
    pub fn render_grayscale(grid: &ElevationGrid) -> GrayImage {
        let normalized = grid.normalized();
        ImageBuffer::from_fn(grid.width() as u32, grid.height() as u32, |x, y| {
            Luma([(normalized[[y as usize, x as usize]] * 255.0) as u8])
        })
    }

    fn write_renderings(grid: &ElevationGrid, target: &JobTarget, written: &mut Vec<OutputArtifact>) -> Result<()> {
        let composite_path = target.path(COMPOSITE_SUFFIX);
        written.push(Self::saved(
            Self::render_composite(grid).save(&composite_path),
            ArtifactKind::ColorRaster,
            "dem_image",
            composite_path,
        )?);

        let top_view_path = target.path(TOP_VIEW_SUFFIX);
        written.push(Self::saved(
            Self::render_top_view(grid).save(&top_view_path),
            ArtifactKind::ColorRaster,
            "dem_topview",
            top_view_path,
        )?);

        let grayscale_path = target.path(GRAYSCALE_SUFFIX);
        written.push(Self::saved(
            Self::render_grayscale(grid).save(&grayscale_path),
            ArtifactKind::GrayscaleRaster,
            "dem_grayscale",
            grayscale_path,
        )?);
        Ok(())
    }

    fn saved(result: image::ImageResult<()>, kind: ArtifactKind, key: &str, path: PathBuf) -> Result<OutputArtifact> {
        result.map_err(|e| DemError::export(kind.name(), format!("{}: {}", path.display(), e)))?;
        debug!("Wrote {}", path.display());
        Ok(OutputArtifact::new(kind, key, path))
    }
}

impl ArtifactEncoder for ColorRasterEncoder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::ColorRaster
    }

    fn stage_message(&self) -> String {
        "Generating DEM visualization image...".to_string()
    }

    fn encode(&self, grid: &ElevationGrid, target: &JobTarget) -> Result<Vec<OutputArtifact>> {
        let mut written = Vec::with_capacity(3);
        if let Err(e) = Self::write_renderings(grid, target, &mut written) {
            // All three files or none.
            for artifact in &written {
                if let Err(remove_err) = fs::remove_file(&artifact.path) {
                    warn!("Could not remove {}: {}", artifact.path.display(), remove_err);
                }
            }
            return Err(e);
        }
        Ok(written)
    }
}
