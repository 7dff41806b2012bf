//! Height-from-shading estimator.
//!
//! Deterministic: the same grid and parameters always produce a bit-identical
//! elevation grid.

use ndarray::{Array2, Zip};
use tracing::{debug, instrument};

use crate::dem_pipeline::common::{ElevationGrid, IntensityGrid};
use crate::dem_pipeline::estimate::filters::{gaussian_blur, gaussian_smooth, sobel};
use crate::dem_pipeline::estimate::types::ProcessingParameters;

/// Guards divisions by a range or length that may be zero. Also decides the
/// flat-input outcome: a uniform grid renormalizes to `0 / (0 + EPSILON) = 0`.
const EPSILON: f64 = 1e-8;

const BASE_WEIGHT: f64 = 0.7;
const GRADIENT_WEIGHT: f64 = 0.3;
const SHADING_WEIGHT: f64 = 0.2;

/// Top-left illumination in image coordinates.
const LIGHT_DIRECTION: (f64, f64) = (-1.0, -1.0);

const FINAL_SMOOTHING_SIGMA: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct HeightEstimator {
    params: ProcessingParameters,
}

impl HeightEstimator {
    pub fn new(params: ProcessingParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ProcessingParameters {
        &self.params
    }

    #[instrument(skip(self, grid), fields(width = grid.width(), height = grid.height()))]
    pub fn estimate(&self, grid: &IntensityGrid) -> ElevationGrid {
        let normalized = grid.view().mapv(|v| v as f64 / 255.0);

        let smoothed = if self.params.smoothing_radius > 0 {
            // Cap for absurd radii coming from form input.
            let radius = (self.params.smoothing_radius as u64).min(grid.width().max(grid.height()) as u64 * 2);
            let size = 2 * radius as usize + 1;
            debug!("Pre-smoothing with {}x{} kernel", size, size);
            gaussian_blur(&normalized, size)
        } else {
            normalized
        };

        let (dx, dy) = sobel(&smoothed);

        let mut gradient = Zip::from(&dx)
            .and(&dy)
            .map_collect(|&gx, &gy| (gx * gx + gy * gy).sqrt());
        let gradient_max = gradient.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        gradient.mapv_inplace(|g| g / (gradient_max + EPSILON));

        let shading = Zip::from(&dx).and(&dy).map_collect(|&gx, &gy| {
            let (nx, ny, nz) = (-gx, -gy, 1.0f64);
            let length = (nx * nx + ny * ny + nz * nz).sqrt() + EPSILON;
            let (nx, ny) = (nx / length, ny / length);
            (-(nx * LIGHT_DIRECTION.0 + ny * LIGHT_DIRECTION.1)).max(0.0)
        });

        let mut estimate = Zip::from(&smoothed)
            .and(&gradient)
            .and(&shading)
            .map_collect(|&base, &grad, &shade| {
                (BASE_WEIGHT * base + GRADIENT_WEIGHT * grad + SHADING_WEIGHT * shade).clamp(0.0, 1.0)
            });

        let (min, max) = min_max(&estimate);
        debug!("Blended estimate range before renormalization: {} - {}", min, max);
        estimate.mapv_inplace(|v| (v - min) / (max - min + EPSILON));

        let extent = self.params.vertical_extent();
        estimate.mapv_inplace(|v| v * extent);

        let mut elevation = gaussian_smooth(&estimate, FINAL_SMOOTHING_SIGMA);

        // Kernel weights sum to one only up to rounding.
        if extent.is_finite() {
            let (lo, hi) = (extent.min(0.0), extent.max(0.0));
            elevation.mapv_inplace(|v| v.clamp(lo, hi));
        }

        ElevationGrid::from_valid(elevation)
    }
}

fn min_max(values: &Array2<f64>) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
