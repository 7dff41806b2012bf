//! Shading-to-elevation pipeline module
//!
//! This module turns a single grayscale raster into a synthetic elevation grid
//! and serializes it into several independent output formats. Stages run
//! strictly in order: raster loading, height estimation, statistics and export,
//! all sequenced by the orchestrator in `conversions`.

pub mod common;
pub mod raster;
pub mod estimate;
pub mod statistics;
pub mod export;
pub mod conversions;

pub use common::{
    DemError,
    ElevationGrid,
    IntensityGrid,
    JobLog,
    Result,
};

pub use raster::{
    ContrastEnhancer,
    ImageCrateReader,
    IntensityReader,
    is_supported_input,
};

pub use estimate::{
    HeightEstimator,
    ProcessingParameters,
    ProcessingParametersBuilder,
};

pub use statistics::{StatisticsSummary, summarize};

pub use export::{
    ArtifactEncoder,
    ArtifactKind,
    Capability,
    ExportConfig,
    ExportConfigBuilder,
    Exporter,
    JobTarget,
    OutputArtifact,
    TiffCompression,
};

pub use conversions::{
    BundleStatus,
    ImageToDemPipeline,
    JobStage,
    ResultBundle,
};
