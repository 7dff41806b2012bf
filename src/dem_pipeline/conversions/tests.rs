use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::dem_pipeline::common::{DemError, ElevationGrid, IntensityGrid, Result};
use crate::dem_pipeline::conversions::{BundleStatus, ImageToDemPipeline, JobStage};
use crate::dem_pipeline::estimate::ProcessingParameters;
use crate::dem_pipeline::export::{
    ArtifactEncoder, ArtifactKind, AsciiGridEncoder, ColorRasterEncoder, ExportConfig, Exporter,
    GeoRasterEncoder, JobTarget, OutputArtifact, SurfaceDocumentEncoder, SurfaceMesh,
    SurfaceRenderer,
};
use crate::dem_pipeline::raster::{ContrastEnhancer, IntensityReader};

struct MockReader {
    should_fail: bool,
    calls: Rc<Cell<usize>>,
}

impl MockReader {
    fn new() -> Self {
        Self {
            should_fail: false,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl IntensityReader for MockReader {
    fn read_intensity(&self, _data: &[u8]) -> Result<IntensityGrid> {
        self.calls.set(self.calls.get() + 1);
        if self.should_fail {
            return Err(DemError::DecodeError("Mock decode error".to_string()));
        }
        let (width, height) = (32, 24);
        let samples = (0..width * height)
            .map(|i| ((i % width) * 7 + (i / width) * 3) as u8)
            .collect();
        IntensityGrid::from_raw(width, height, samples)
    }
}

struct FailingRenderer;

impl SurfaceRenderer for FailingRenderer {
    fn render(&self, _mesh: &SurfaceMesh) -> Result<String> {
        Err(DemError::EncodeError("Mock render error".to_string()))
    }
}

struct FailingEncoder(ArtifactKind);

impl ArtifactEncoder for FailingEncoder {
    fn kind(&self) -> ArtifactKind {
        self.0
    }

    fn stage_message(&self) -> String {
        format!("Writing {}...", self.0.name())
    }

    fn encode(&self, _grid: &ElevationGrid, _target: &JobTarget) -> Result<Vec<OutputArtifact>> {
        Err(DemError::OutputWriteError("Mock write error".to_string()))
    }
}

fn fake_input(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"fake image data").unwrap();
    path
}

fn pipeline_with(reader: MockReader, exporter: Exporter) -> ImageToDemPipeline<MockReader> {
    ImageToDemPipeline::with_custom(reader, ContrastEnhancer::default(), exporter)
}

#[test]
fn test_successful_job() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "moon.png");
    let out = dir.path().join("out");

    let pipeline = pipeline_with(MockReader::new(), Exporter::default());
    let bundle = pipeline.process(&input, &out, "job1", &ProcessingParameters::default());

    assert_eq!(bundle.status, BundleStatus::Success);
    assert!(bundle.error_message.is_none());
    assert_eq!(bundle.artifacts.len(), 6);
    assert!(bundle.artifacts.iter().all(|a| a.path.exists()));
    assert_eq!(
        bundle.stages,
        [
            JobStage::Start,
            JobStage::Preprocessing,
            JobStage::Estimating,
            JobStage::Exporting,
            JobStage::Success,
        ]
    );

    let lines = bundle.log.lines();
    assert_eq!(lines[0], "Starting DEM processing...");
    assert_eq!(lines[1], "Loading image...");
    assert_eq!(lines[2], "Image loaded: 32x24 pixels");
    assert_eq!(lines[3], "Enhancing image contrast...");
    assert_eq!(lines[4], "Applying height-from-shading algorithm...");
    assert_eq!(bundle.log.last(), Some("DEM processing completed successfully!"));
    assert!(bundle.log.contains("Mean elevation:"));

    let stats = bundle.statistics.unwrap();
    assert_eq!(stats.sample_count, 32 * 24);
    assert_eq!(bundle.elevation.as_ref().unwrap().dim(), (24, 32));

    let files = bundle.output_files();
    assert_eq!(files["dem_image"], "job1_dem_image.png");
    assert_eq!(files["dem_tiff"], "job1_dem.tif");
    assert_eq!(files["dem_ascii"], "job1_dem.asc");
    assert_eq!(files["visualization"], "job1_3d_plot.html");
}

#[test]
fn test_reader_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "moon.png");
    let reader = MockReader {
        should_fail: true,
        calls: Rc::new(Cell::new(0)),
    };

    let pipeline = pipeline_with(reader, Exporter::default());
    let bundle = pipeline.process(&input, dir.path(), "job2", &ProcessingParameters::default());

    assert_eq!(bundle.status, BundleStatus::Failure);
    assert!(bundle.artifacts.is_empty());
    assert!(bundle.statistics.is_none());
    assert!(bundle.elevation.is_none());
    assert_eq!(
        bundle.error_message.as_deref(),
        Some("Failed to decode input image: Mock decode error")
    );
    assert_eq!(
        bundle.log.last(),
        Some("Processing failed: Failed to decode input image: Mock decode error")
    );
    assert_eq!(
        bundle.stages,
        [JobStage::Start, JobStage::Preprocessing, JobStage::Failure]
    );
    assert!(!dir.path().join("job2_dem.asc").exists());
}

#[test]
fn test_unsupported_extension_rejected_before_read() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "notes.txt");
    let reader = MockReader::new();
    let calls = reader.calls.clone();

    let bundle = pipeline_with(reader, Exporter::default()).process(
        &input,
        dir.path(),
        "job3",
        &ProcessingParameters::default(),
    );

    assert_eq!(bundle.status, BundleStatus::Failure);
    assert_eq!(calls.get(), 0);
    assert!(bundle.error_message.unwrap().contains("unsupported file type"));
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = pipeline_with(MockReader::new(), Exporter::default()).process(
        dir.path().join("absent.png"),
        dir.path(),
        "job4",
        &ProcessingParameters::default(),
    );

    assert_eq!(bundle.status, BundleStatus::Failure);
    assert!(bundle.error_message.unwrap().starts_with("Failed to read input file"));
    assert_eq!(bundle.log.lines()[0], "Starting DEM processing...");
}

#[test]
fn test_surface_failure_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "moon.png");
    let exporter = Exporter::with_encoders(vec![
        Box::new(ColorRasterEncoder),
        Box::new(GeoRasterEncoder::new(ExportConfig::default())),
        Box::new(AsciiGridEncoder),
        Box::new(SurfaceDocumentEncoder::with_renderer(150, Box::new(FailingRenderer))),
    ]);

    let bundle = pipeline_with(MockReader::new(), exporter).process(
        &input,
        dir.path(),
        "job5",
        &ProcessingParameters::default(),
    );

    assert_eq!(bundle.status, BundleStatus::Success);
    assert_eq!(bundle.artifacts.len(), 6);
    let surface = bundle.artifact("visualization").unwrap();
    assert!(surface.degraded);
    let html = std::fs::read_to_string(&surface.path).unwrap();
    assert!(html.contains("3D Visualization Not Available"));
    assert!(bundle.log.contains("Mock render error"));
    assert!(!bundle.artifact("dem_tiff").unwrap().degraded);
}

#[test]
fn test_georeferencing_disabled_degrades_tiff() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "moon.png");
    let config = ExportConfig::builder().georeferencing(false).build();

    let bundle = pipeline_with(MockReader::new(), Exporter::new(config)).process(
        &input,
        dir.path(),
        "job6",
        &ProcessingParameters::default(),
    );

    assert_eq!(bundle.status, BundleStatus::Success);
    let tiff = bundle.artifact("dem_tiff").unwrap();
    assert_eq!(tiff.kind, ArtifactKind::GeoRaster);
    assert!(tiff.degraded);
    assert!(tiff.path.exists());
}

#[test]
fn test_no_artifacts_fails_job() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "moon.png");
    let exporter = Exporter::with_encoders(vec![
        Box::new(FailingEncoder(ArtifactKind::ColorRaster)),
        Box::new(FailingEncoder(ArtifactKind::AsciiGrid)),
    ]);

    let bundle = pipeline_with(MockReader::new(), exporter).process(
        &input,
        dir.path(),
        "job7",
        &ProcessingParameters::default(),
    );

    assert_eq!(bundle.status, BundleStatus::Failure);
    assert!(bundle.artifacts.is_empty());
    assert!(bundle.statistics.is_none());
    assert!(bundle.log.contains("Writing ASCII grid..."));
    assert_eq!(bundle.stages.last(), Some(&JobStage::Failure));
}

#[test]
fn test_form_with_bad_number_fails_at_start() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "moon.png");
    let reader = MockReader::new();
    let calls = reader.calls.clone();

    let mut fields = HashMap::new();
    fields.insert("scale_factor".to_string(), "tall".to_string());

    let bundle = pipeline_with(reader, Exporter::default()).process_form(
        &input,
        dir.path(),
        "job8",
        &fields,
    );

    assert_eq!(bundle.status, BundleStatus::Failure);
    assert_eq!(calls.get(), 0);
    assert_eq!(bundle.stages, [JobStage::Start, JobStage::Failure]);
    assert!(bundle.error_message.unwrap().contains("scale_factor"));
}

#[test]
fn test_bundle_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "moon.png");
    let bundle = pipeline_with(MockReader::new(), Exporter::default()).process(
        &input,
        dir.path(),
        "job9",
        &ProcessingParameters::default(),
    );

    let json: serde_json::Value = serde_json::from_str(&bundle.to_json().unwrap()).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["job_id"], "job9");
    assert_eq!(json["log"][0], "Starting DEM processing...");
    assert_eq!(json["stages"][4], "success");
    assert!(json.get("elevation").is_none());
}

#[test]
fn test_non_finite_parameters_fail_at_start() {
    let dir = tempfile::tempdir().unwrap();
    let input = fake_input(dir.path(), "moon.png");
    let reader = MockReader::new();
    let calls = reader.calls.clone();
    let params = ProcessingParameters::builder().scale_factor(f64::NAN).build();

    let bundle = pipeline_with(reader, Exporter::default()).process(&input, dir.path(), "job10", &params);

    assert_eq!(bundle.status, BundleStatus::Failure);
    assert_eq!(calls.get(), 0);
    assert!(bundle.artifacts.is_empty());
    assert_eq!(bundle.stages, [JobStage::Start, JobStage::Failure]);
    assert!(bundle.error_message.unwrap().contains("scale_factor"));
    assert_eq!(bundle.log.lines()[0], "Starting DEM processing...");
}
