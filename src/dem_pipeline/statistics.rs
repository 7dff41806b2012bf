//! Scalar summary of an elevation grid.

use serde::{Deserialize, Serialize};

use crate::dem_pipeline::common::ElevationGrid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub sample_count: usize,
}

/// Min, max, mean and population standard deviation over every sample.
pub fn summarize(grid: &ElevationGrid) -> StatisticsSummary {
    let view = grid.view();
    let count = view.len();
    let (min, max) = grid.value_range();

    let mean = view.iter().sum::<f64>() / count as f64;
    let variance = view.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;

    StatisticsSummary {
        min,
        max,
        mean,
        std_dev: variance.sqrt(),
        sample_count: count,
    }
}

impl StatisticsSummary {
    /// Human-readable lines appended to the job log.
    pub fn log_lines(&self) -> Vec<String> {
        vec![
            format!("Elevation range: {:.2} - {:.2} m", self.min, self.max),
            format!("Mean elevation: {:.2} m", self.mean),
            format!("Standard deviation: {:.2} m", self.std_dev),
        ]
    }
}
