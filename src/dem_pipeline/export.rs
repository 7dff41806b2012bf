//! Multi-format export of an elevation grid
//!
//! Each output format is an [`ArtifactEncoder`]; the [`Exporter`] runs them in
//! order and keeps one encoder's failure from affecting the rest.

pub mod ascii_grid;
pub mod color_raster;
pub mod colormap;
mod encoder;
mod exporter;
pub mod geo_raster;
mod geotiff_writer;
mod gray16_tiff_writer;
pub mod surface;
mod tiff_writer;
pub mod types;

pub use ascii_grid::{AsciiGridEncoder, AsciiGridHeader, encode_ascii_grid, parse_ascii_grid, read_ascii_grid};
pub use color_raster::ColorRasterEncoder;
pub use encoder::ArtifactEncoder;
pub use exporter::Exporter;
pub use geo_raster::GeoRasterEncoder;
pub use geotiff_writer::{GeoTiffWriter, IdentityGeoTransform};
pub use gray16_tiff_writer::Gray16TiffWriter;
pub use surface::{PlotlyRenderer, SurfaceDocumentEncoder, SurfaceMesh, SurfaceRenderer};
pub use tiff_writer::ElevationTiffWriter;
pub use types::{
    ArtifactKind, Capability, ExportConfig, ExportConfigBuilder, JobTarget, OutputArtifact,
    TiffCompression,
};
