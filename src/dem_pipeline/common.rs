//! Common utilities module
//!
//! This module contains the error taxonomy, the grid types and the job log
//! shared by every stage of the pipeline.

pub mod border;
pub mod error;
pub mod grid;
pub mod job_log;

pub use border::BorderMode;
pub use error::{DemError, Result};
pub use grid::{ElevationGrid, IntensityGrid};
pub use job_log::JobLog;
