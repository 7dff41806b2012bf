//! Height estimation module
//!
//! This module converts a contrast-normalized intensity grid into an elevation
//! grid using brightness, gradient magnitude and a fixed-light shading term.

pub mod filters;
mod height;
pub mod types;

pub use height::HeightEstimator;
pub use types::{ProcessingParameters, ProcessingParametersBuilder};
