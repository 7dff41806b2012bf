use std::collections::HashMap;
use std::path::Path;

use tracing::{error, info, instrument, warn};

use crate::dem_pipeline::common::{DemError, ElevationGrid, JobLog, Result};
use crate::dem_pipeline::conversions::types::{BundleStatus, JobStage, ResultBundle};
use crate::dem_pipeline::estimate::{HeightEstimator, ProcessingParameters};
use crate::dem_pipeline::export::{ExportConfig, Exporter, JobTarget, OutputArtifact};
use crate::dem_pipeline::raster::{ContrastEnhancer, ImageCrateReader, IntensityReader, is_supported_input};
use crate::dem_pipeline::statistics::{self, StatisticsSummary};

/// Per-invocation state. Created before anything can fail so the failure
/// bundle always has the lines logged so far.
struct JobRun {
    job_id: String,
    stage: JobStage,
    stages: Vec<JobStage>,
    log: JobLog,
}

impl JobRun {
    fn new(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage: JobStage::Start,
            stages: vec![JobStage::Start],
            log: JobLog::new(),
        }
    }

    fn enter(&mut self, next: JobStage) {
        debug_assert!(self.stage.can_transition_to(next), "{:?} -> {:?}", self.stage, next);
        info!(job_id = %self.job_id, from = ?self.stage, to = ?next, "Stage transition");
        self.stage = next;
        self.stages.push(next);
    }

    fn succeed(
        mut self,
        elevation: ElevationGrid,
        statistics: StatisticsSummary,
        artifacts: Vec<OutputArtifact>,
    ) -> ResultBundle {
        self.log.push("DEM processing completed successfully!");
        self.enter(JobStage::Success);
        ResultBundle {
            job_id: self.job_id,
            status: BundleStatus::Success,
            artifacts,
            statistics: Some(statistics),
            log: self.log,
            stages: self.stages,
            error_message: None,
            elevation: Some(elevation),
        }
    }

    fn fail(mut self, err: DemError) -> ResultBundle {
        error!(job_id = %self.job_id, stage = ?self.stage, "Processing failed: {}", err);
        let message = err.to_string();
        self.log.push(format!("Processing failed: {}", message));
        self.enter(JobStage::Failure);
        ResultBundle {
            job_id: self.job_id,
            status: BundleStatus::Failure,
            artifacts: Vec::new(),
            statistics: None,
            log: self.log,
            stages: self.stages,
            error_message: Some(message),
            elevation: None,
        }
    }
}

pub struct ImageToDemPipeline<R: IntensityReader> {
    reader: R,
    enhancer: ContrastEnhancer,
    exporter: Exporter,
}

impl ImageToDemPipeline<ImageCrateReader> {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            reader: ImageCrateReader,
            enhancer: ContrastEnhancer::default(),
            exporter: Exporter::new(config),
        }
    }
}

impl Default for ImageToDemPipeline<ImageCrateReader> {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

impl<R: IntensityReader> ImageToDemPipeline<R> {
    pub fn with_custom(reader: R, enhancer: ContrastEnhancer, exporter: Exporter) -> Self {
        Self {
            reader,
            enhancer,
            exporter,
        }
    }

    /// Runs one job. Never returns an error: failures come back as a
    /// [`BundleStatus::Failure`] bundle with the partial log.
    #[instrument(skip(self, input_path, output_dir, params), fields(input = %input_path.as_ref().display()))]
    pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_dir: Q,
        job_id: &str,
        params: &ProcessingParameters,
    ) -> ResultBundle {
        let mut job = JobRun::new(job_id);
        match self.run(&mut job, input_path.as_ref(), output_dir.as_ref(), params) {
            Ok((elevation, statistics, artifacts)) => job.succeed(elevation, statistics, artifacts),
            Err(e) => job.fail(e),
        }
    }

    /// Like [`process`](Self::process), but parses raw form fields first. A
    /// non-numeric field fails the job before any stage runs.
    pub fn process_form<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_dir: Q,
        job_id: &str,
        fields: &HashMap<String, String>,
    ) -> ResultBundle {
        match ProcessingParameters::from_form(fields) {
            Ok(params) => self.process(input_path, output_dir, job_id, &params),
            Err(e) => {
                let mut job = JobRun::new(job_id);
                job.log.push("Starting DEM processing...");
                job.fail(e)
            }
        }
    }

    fn run(
        &self,
        job: &mut JobRun,
        input_path: &Path,
        output_dir: &Path,
        params: &ProcessingParameters,
    ) -> Result<(ElevationGrid, StatisticsSummary, Vec<OutputArtifact>)> {
        job.log.push("Starting DEM processing...");
        params.check_finite()?;

        job.enter(JobStage::Preprocessing);
        job.log.push("Loading image...");
        let intensity = {
            let _span = tracing::info_span!("load_image").entered();
            if !is_supported_input(input_path) {
                return Err(DemError::DecodeError(format!(
                    "{}: unsupported file type",
                    input_path.display()
                )));
            }
            let data = std::fs::read(input_path).map_err(|e| {
                DemError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?;
            self.reader.read_intensity(&data)?
        };
        job.log.push(format!(
            "Image loaded: {}x{} pixels",
            intensity.width(),
            intensity.height()
        ));

        job.log.push("Enhancing image contrast...");
        let enhanced = {
            let _span = tracing::info_span!("enhance_contrast").entered();
            self.enhancer.apply(&intensity)
        };

        job.enter(JobStage::Estimating);
        job.log.push("Applying height-from-shading algorithm...");
        let elevation = {
            let _span = tracing::info_span!("estimate_height").entered();
            HeightEstimator::new(*params).estimate(&enhanced)
        };

        job.enter(JobStage::Exporting);
        std::fs::create_dir_all(output_dir).map_err(|e| {
            DemError::OutputWriteError(format!("{}: {}", output_dir.display(), e))
        })?;
        let target = JobTarget::new(output_dir, job.job_id.as_str());
        let artifacts = self.exporter.export(&elevation, &target, &mut job.log);

        job.log.push("Computing DEM statistics...");
        let stats = statistics::summarize(&elevation);
        job.log.extend(stats.log_lines());

        if artifacts.is_empty() {
            warn!("No artifacts were written");
            return Err(DemError::export("DEM outputs", "no output artifacts were produced"));
        }

        info!(
            width = elevation.width(),
            height = elevation.height(),
            artifacts = artifacts.len(),
            "Job complete"
        );
        Ok((elevation, stats, artifacts))
    }

    pub fn enhancer(&self) -> &ContrastEnhancer {
        &self.enhancer
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }
}
