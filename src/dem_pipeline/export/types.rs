//! Export configuration and artifact descriptor types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Logical output formats produced per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    ColorRaster,
    GrayscaleRaster,
    GeoRaster,
    AsciiGrid,
    SurfaceDocument,
}

impl ArtifactKind {
    pub const ALL: &[ArtifactKind] = &[
        Self::ColorRaster,
        Self::GrayscaleRaster,
        Self::GeoRaster,
        Self::AsciiGrid,
        Self::SurfaceDocument,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ColorRaster => "color raster",
            Self::GrayscaleRaster => "grayscale raster",
            Self::GeoRaster => "georeferenced raster",
            Self::AsciiGrid => "ASCII grid",
            Self::SurfaceDocument => "3D surface document",
        }
    }
}

/// One file written for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub kind: ArtifactKind,
    /// Stable key used by the job store (`dem_image`, `dem_tiff`, ...)
    pub key: String,
    pub path: PathBuf,
    /// Set when the file came from a fallback encoding
    pub degraded: bool,
}

impl OutputArtifact {
    pub fn new(kind: ArtifactKind, key: impl Into<String>, path: PathBuf) -> Self {
        Self {
            kind,
            key: key.into(),
            path,
            degraded: false,
        }
    }

    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Output location for one job: every file is `{output_dir}/{job_id}{suffix}`.
#[derive(Debug, Clone)]
pub struct JobTarget {
    output_dir: PathBuf,
    job_id: String,
}

impl JobTarget {
    pub fn new(output_dir: impl Into<PathBuf>, job_id: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            job_id: job_id.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.job_id, suffix))
    }
}

/// Result of an encoder's backend probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported(String),
}

impl Capability {
    pub fn is_supported(&self) -> bool {
        matches!(self, Capability::Supported)
    }
}

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

impl TiffCompression {
    pub(crate) fn to_tiff(self) -> tiff::encoder::Compression {
        use tiff::encoder::Compression;
        use tiff::encoder::compression::DeflateLevel;

        match self {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

/// Configuration for the exporter
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Compression method for TIFF outputs
    pub compression: TiffCompression,
    /// Predictor for the 16-bit fallback raster (2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// Whether the georeferencing TIFF backend may be used
    pub georeferencing: bool,
    /// Largest mesh dimension in the 3D surface document
    pub max_surface_size: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
            georeferencing: true,
            max_surface_size: 150,
        }
    }
}

impl ExportConfig {
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::default()
    }
}

/// Builder for ExportConfig
#[derive(Default)]
pub struct ExportConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    georeferencing: Option<bool>,
    max_surface_size: Option<usize>,
}

impl ExportConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn georeferencing(mut self, enable: bool) -> Self {
        self.georeferencing = Some(enable);
        self
    }

    pub fn max_surface_size(mut self, size: usize) -> Self {
        self.max_surface_size = Some(size);
        self
    }

    pub fn build(self) -> ExportConfig {
        let default = ExportConfig::default();
        ExportConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            georeferencing: self.georeferencing.unwrap_or(default.georeferencing),
            max_surface_size: self.max_surface_size.unwrap_or(default.max_surface_size).max(1),
        }
    }
}
