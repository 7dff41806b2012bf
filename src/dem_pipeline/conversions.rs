//! Pipeline conversions module
//!
//! Orchestrates a single image-to-DEM job: load, enhance, estimate, export,
//! summarize, and assemble the result bundle.

mod image_to_dem;
mod types;

#[cfg(test)]
mod tests;

pub use image_to_dem::ImageToDemPipeline;
pub use types::{BundleStatus, JobStage, ResultBundle};
