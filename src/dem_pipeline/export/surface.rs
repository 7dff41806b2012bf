//! Interactive 3D surface document (`{job}_3d_plot.html`).
//!
//! The grid is downsampled to at most `max_size` samples per side before it
//! becomes a mesh. Rendering goes through [`SurfaceRenderer`]; when it fails
//! a static page pointing at the GeoTIFF is written instead.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::dem_pipeline::common::{DemError, ElevationGrid, Result};
use crate::dem_pipeline::export::encoder::ArtifactEncoder;
use crate::dem_pipeline::export::types::{ArtifactKind, JobTarget, OutputArtifact};

pub const SURFACE_SUFFIX: &str = "_3d_plot.html";
pub const SURFACE_KEY: &str = "visualization";
pub const DEFAULT_MAX_SURFACE_SIZE: usize = 150;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const PLOT_DIV_ID: &str = "dem-3d-plot";

pub const FALLBACK_DOCUMENT: &str = r#"<!DOCTYPE html>
<html>
<head><title>3D DEM Visualization</title></head>
<body>
    <div style="text-align: center; padding: 50px;">
        <h2>3D Visualization Not Available</h2>
        <p>The interactive 3D model could not be generated for this job.</p>
        <p>Please download the GeoTIFF file for analysis in GIS software.</p>
    </div>
</body>
</html>
"#;

/// Surface mesh: `z[row][col]` over integer pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    pub z: Array2<f64>,
}

impl SurfaceMesh {
    /// Downsamples when either side exceeds `max_size`, using a single scale
    /// `min(max/H, max/W)` and bilinear resampling with pixel-center alignment.
    pub fn from_grid(grid: &ElevationGrid, max_size: usize) -> Self {
        let (height, width) = grid.dim();
        if height <= max_size && width <= max_size {
            return Self {
                z: grid.view().to_owned(),
            };
        }

        let scale = (max_size as f64 / height as f64).min(max_size as f64 / width as f64);
        let new_height = ((height as f64 * scale) as usize).max(1);
        let new_width = ((width as f64 * scale) as usize).max(1);
        debug!(
            "Downsampling surface {}x{} -> {}x{}",
            width, height, new_width, new_height
        );

        Self {
            z: resize_bilinear(grid.view().to_owned(), new_height, new_width),
        }
    }

    pub fn rows(&self) -> usize {
        self.z.nrows()
    }

    pub fn cols(&self) -> usize {
        self.z.ncols()
    }

    pub fn is_finite(&self) -> bool {
        self.z.iter().all(|v| v.is_finite())
    }
}

/// Source coordinate and weight for one destination index.
fn linear_tap(dst: usize, inv_scale: f64, src_len: usize) -> (usize, usize, f64) {
    let pos = (dst as f64 + 0.5) * inv_scale - 0.5;
    if pos <= 0.0 {
        return (0, 0, 0.0);
    }
    let lo = pos.floor() as usize;
    if lo >= src_len - 1 {
        return (src_len - 1, src_len - 1, 0.0);
    }
    (lo, lo + 1, pos - lo as f64)
}

fn resize_bilinear(src: Array2<f64>, rows: usize, cols: usize) -> Array2<f64> {
    let (src_rows, src_cols) = src.dim();
    let inv_y = src_rows as f64 / rows as f64;
    let inv_x = src_cols as f64 / cols as f64;

    let row_taps: Vec<_> = (0..rows).map(|r| linear_tap(r, inv_y, src_rows)).collect();
    let col_taps: Vec<_> = (0..cols).map(|c| linear_tap(c, inv_x, src_cols)).collect();

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (y0, y1, fy) = row_taps[r];
        let (x0, x1, fx) = col_taps[c];
        let top = src[[y0, x0]] * (1.0 - fx) + src[[y0, x1]] * fx;
        let bottom = src[[y1, x0]] * (1.0 - fx) + src[[y1, x1]] * fx;
        top * (1.0 - fy) + bottom * fy
    })
}

/// Turns a mesh into a standalone document.
pub trait SurfaceRenderer {
    fn render(&self, mesh: &SurfaceMesh) -> Result<String>;
}

/// Plotly surface plot loaded from the public CDN.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlotlyRenderer;

impl PlotlyRenderer {
    pub fn figure(mesh: &SurfaceMesh) -> Value {
        let z: Vec<Vec<f64>> = mesh.z.rows().into_iter().map(|row| row.to_vec()).collect();
        let x: Vec<usize> = (0..mesh.cols()).collect();
        let y: Vec<usize> = (0..mesh.rows()).collect();
        let transparent = "rgba(0,0,0,0)";
        let axis = |title: &str| {
            json!({
                "title": { "text": title },
                "backgroundcolor": transparent,
                "gridcolor": "lightgray"
            })
        };

        json!({
            "data": [{
                "type": "surface",
                "z": z,
                "x": x,
                "y": y,
                "colorscale": "Earth",
                "colorbar": { "title": { "text": "Elevation (m)" } },
                "contours": {
                    "z": { "show": true, "usecolormap": true, "project": { "z": true }, "size": 5 }
                },
                "lighting": {
                    "ambient": 0.4,
                    "diffuse": 0.8,
                    "fresnel": 0.1,
                    "specular": 0.05,
                    "roughness": 0.05
                }
            }],
            "layout": {
                "title": { "text": "3D Digital Elevation Model", "x": 0.5, "font": { "size": 16 } },
                "scene": {
                    "xaxis": axis("X Coordinate (pixels)"),
                    "yaxis": axis("Y Coordinate (pixels)"),
                    "zaxis": axis("Elevation (meters)"),
                    "camera": { "eye": { "x": 1.5, "y": 1.5, "z": 1.2 } },
                    "bgcolor": transparent
                },
                "width": 800,
                "height": 600,
                "margin": { "l": 0, "r": 0, "t": 40, "b": 0 },
                "paper_bgcolor": "white",
                "plot_bgcolor": "white"
            }
        })
    }
}

impl SurfaceRenderer for PlotlyRenderer {
    fn render(&self, mesh: &SurfaceMesh) -> Result<String> {
        if !mesh.is_finite() {
            return Err(DemError::export(
                ArtifactKind::SurfaceDocument.name(),
                "mesh contains non-finite elevations",
            ));
        }

        let figure = Self::figure(mesh);

        let data = serde_json::to_string(&figure["data"])
            .map_err(|e| DemError::EncodeError(e.to_string()))?;
        let layout = serde_json::to_string(&figure["layout"])
            .map_err(|e| DemError::EncodeError(e.to_string()))?;

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>3D DEM Visualization</title>
<script src="{cdn}" charset="utf-8"></script>
</head>
<body>
<div id="{div}" style="width:800px;height:600px;"></div>
<script type="text/javascript">
Plotly.newPlot("{div}", {data}, {layout}, {{"responsive": true}});
</script>
</body>
</html>
"#,
            cdn = PLOTLY_CDN,
            div = PLOT_DIV_ID,
            data = data,
            layout = layout,
        ))
    }
}

pub struct SurfaceDocumentEncoder {
    max_size: usize,
    renderer: Box<dyn SurfaceRenderer>,
}

impl SurfaceDocumentEncoder {
    pub fn new(max_size: usize) -> Self {
        Self::with_renderer(max_size, Box::new(PlotlyRenderer))
    }

    pub fn with_renderer(max_size: usize, renderer: Box<dyn SurfaceRenderer>) -> Self {
        Self {
            max_size: max_size.max(1),
            renderer,
        }
    }

    fn write(path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents)
            .map_err(|e| DemError::OutputWriteError(format!("{}: {}", path.display(), e)))
    }
}

impl Default for SurfaceDocumentEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SURFACE_SIZE)
    }
}

impl ArtifactEncoder for SurfaceDocumentEncoder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::SurfaceDocument
    }

    fn stage_message(&self) -> String {
        "Generating 3D visualization...".to_string()
    }

    fn encode(&self, grid: &ElevationGrid, target: &JobTarget) -> Result<Vec<OutputArtifact>> {
        let mesh = SurfaceMesh::from_grid(grid, self.max_size);
        let document = self.renderer.render(&mesh)?;

        let path = target.path(SURFACE_SUFFIX);
        Self::write(&path, &document)?;
        debug!("Wrote {} ({}x{} mesh)", path.display(), mesh.cols(), mesh.rows());
        Ok(vec![OutputArtifact::new(ArtifactKind::SurfaceDocument, SURFACE_KEY, path)])
    }

    fn fallback(
        &self,
        _grid: &ElevationGrid,
        target: &JobTarget,
        cause: &DemError,
    ) -> Option<Result<Vec<OutputArtifact>>> {
        warn!("Error creating 3D visualization: {}", cause);
        let path = target.path(SURFACE_SUFFIX);
        let written = Self::write(&path, FALLBACK_DOCUMENT).map(|()| {
            vec![OutputArtifact::new(ArtifactKind::SurfaceDocument, SURFACE_KEY, path).degraded()]
        });
        Some(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(rows: usize, cols: usize) -> ElevationGrid {
        ElevationGrid::new(Array2::from_shape_fn((rows, cols), |(r, c)| (r + 2 * c) as f64)).unwrap()
    }

    #[test]
    fn test_small_grid_passes_through() {
        let source = grid(100, 100);
        let mesh = SurfaceMesh::from_grid(&source, 150);
        assert_eq!(mesh.z, source.view().to_owned());
    }

    #[test]
    fn test_large_grid_is_downsampled() {
        let mesh = SurfaceMesh::from_grid(&grid(300, 300), 150);
        assert_eq!((mesh.rows(), mesh.cols()), (150, 150));

        let mesh = SurfaceMesh::from_grid(&grid(600, 200), 150);
        assert_eq!((mesh.rows(), mesh.cols()), (150, 50));
    }

    #[test]
    fn test_halving_averages_neighbours() {
        // 2x downscale samples midway between source pixels.
        let mesh = SurfaceMesh::from_grid(&grid(4, 4), 2);
        assert_relative_eq!(mesh.z[[0, 0]], (0.5 + 2.0 * 0.5), epsilon = 1e-12);
        assert_relative_eq!(mesh.z[[1, 1]], (2.5 + 2.0 * 2.5), epsilon = 1e-12);
    }

    #[test]
    fn test_extreme_aspect_keeps_one_row() {
        let mesh = SurfaceMesh::from_grid(&grid(1, 1000), 150);
        assert_eq!((mesh.rows(), mesh.cols()), (1, 150));
    }

    #[test]
    fn test_plotly_document() {
        let mesh = SurfaceMesh::from_grid(&grid(3, 4), 150);
        let html = PlotlyRenderer.render(&mesh).unwrap();
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains(r#"id="dem-3d-plot""#));
        assert!(html.contains(r#""colorscale":"Earth""#));
        assert!(html.contains("3D Digital Elevation Model"));

        let figure = PlotlyRenderer::figure(&mesh);
        assert_eq!(figure["data"][0]["z"][2][3], json!(8.0));
        assert_eq!(figure["layout"]["scene"]["camera"]["eye"]["z"], json!(1.2));
    }

    #[test]
    fn test_non_finite_mesh_is_rejected() {
        let mesh = SurfaceMesh {
            z: Array2::from_elem((2, 2), f64::NAN),
        };
        assert!(PlotlyRenderer.render(&mesh).is_err());
    }

    #[test]
    fn test_fallback_document() {
        let dir = tempfile::tempdir().unwrap();
        let target = JobTarget::new(dir.path(), "s");
        let cause = DemError::export("3D surface document", "boom");
        let artifacts = SurfaceDocumentEncoder::default()
            .fallback(&grid(2, 2), &target, &cause)
            .unwrap()
            .unwrap();

        assert!(artifacts[0].degraded);
        let text = fs::read_to_string(dir.path().join("s_3d_plot.html")).unwrap();
        assert!(text.contains("3D Visualization Not Available"));
        assert!(text.contains("GeoTIFF"));
    }
}
