//! Grid types flowing between pipeline stages

use ndarray::{Array2, ArrayView2};

use crate::dem_pipeline::common::error::{DemError, Result};

/// Single-channel 8-bit intensity raster, row-major (row 0 = top).
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityGrid {
    data: Array2<u8>,
}

impl IntensityGrid {
    /// Wraps an array of shape `(height, width)`. Zero-area arrays are rejected.
    pub fn new(data: Array2<u8>) -> Result<Self> {
        let (height, width) = data.dim();
        if width == 0 || height == 0 {
            return Err(DemError::InvalidDimensions(width, height));
        }
        Ok(Self { data })
    }

    /// For stage outputs whose shape is inherited from an already-valid grid.
    pub(crate) fn from_valid(data: Array2<u8>) -> Self {
        debug_assert!(!data.is_empty());
        Self { data }
    }

    /// Builds a grid from a row-major sample buffer.
    pub fn from_raw(width: usize, height: usize, samples: Vec<u8>) -> Result<Self> {
        let data = Array2::from_shape_vec((height, width), samples)
            .map_err(|_| DemError::InvalidDimensions(width, height))?;
        Self::new(data)
    }

    /// Uniform grid, mostly useful for tests and calibration inputs.
    pub fn filled(width: usize, height: usize, value: u8) -> Result<Self> {
        Self::new(Array2::from_elem((height, width), value))
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    pub fn into_inner(self) -> Array2<u8> {
        self.data
    }
}

/// Synthesized elevation values, same shape as the intensity grid they came from.
///
/// Produced once per job and never mutated afterwards; exporters only get
/// read access.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    data: Array2<f64>,
}

impl ElevationGrid {
    pub fn new(data: Array2<f64>) -> Result<Self> {
        let (height, width) = data.dim();
        if width == 0 || height == 0 {
            return Err(DemError::InvalidDimensions(width, height));
        }
        Ok(Self { data })
    }

    pub(crate) fn from_valid(data: Array2<f64>) -> Self {
        debug_assert!(!data.is_empty());
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// `(height, width)`, matching ndarray's `dim()` ordering.
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Minimum and maximum over all samples.
    pub fn value_range(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Linear rescale of every sample to `[0, 1]`. A flat grid maps to all zeros.
    pub fn normalized(&self) -> Array2<f64> {
        let (min, max) = self.value_range();
        let span = max - min;
        if span > 0.0 && span.is_finite() {
            self.data.mapv(|v| (v - min) / span)
        } else {
            Array2::zeros(self.data.dim())
        }
    }
}
