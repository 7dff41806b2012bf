use tracing::{info, instrument, warn};

use crate::dem_pipeline::common::{DemError, ElevationGrid, JobLog};
use crate::dem_pipeline::export::ascii_grid::AsciiGridEncoder;
use crate::dem_pipeline::export::color_raster::ColorRasterEncoder;
use crate::dem_pipeline::export::encoder::ArtifactEncoder;
use crate::dem_pipeline::export::geo_raster::GeoRasterEncoder;
use crate::dem_pipeline::export::surface::SurfaceDocumentEncoder;
use crate::dem_pipeline::export::types::{Capability, ExportConfig, JobTarget, OutputArtifact};

/// Runs every encoder in order. A failing encoder never stops the others:
/// its fallback runs if it has one, otherwise the artifact is omitted.
pub struct Exporter {
    encoders: Vec<Box<dyn ArtifactEncoder>>,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        let max_surface_size = config.max_surface_size;
        Self::with_encoders(vec![
            Box::new(ColorRasterEncoder),
            Box::new(GeoRasterEncoder::new(config)),
            Box::new(AsciiGridEncoder),
            Box::new(SurfaceDocumentEncoder::new(max_surface_size)),
        ])
    }

    pub fn with_encoders(encoders: Vec<Box<dyn ArtifactEncoder>>) -> Self {
        Self { encoders }
    }

    pub fn encoders(&self) -> &[Box<dyn ArtifactEncoder>] {
        &self.encoders
    }

    #[instrument(skip_all, fields(job_id = target.job_id()))]
    pub fn export(&self, grid: &ElevationGrid, target: &JobTarget, log: &mut JobLog) -> Vec<OutputArtifact> {
        let mut artifacts = Vec::new();
        for encoder in &self.encoders {
            let _span = tracing::info_span!("encode", kind = encoder.kind().name()).entered();
            log.push(encoder.stage_message());
            artifacts.extend(Self::run_encoder(encoder.as_ref(), grid, target, log));
        }
        info!(count = artifacts.len(), "Export complete");
        artifacts
    }

    fn run_encoder(
        encoder: &dyn ArtifactEncoder,
        grid: &ElevationGrid,
        target: &JobTarget,
        log: &mut JobLog,
    ) -> Vec<OutputArtifact> {
        let kind = encoder.kind().name();

        let cause = match encoder.capability() {
            Capability::Unsupported(reason) => {
                let cause = DemError::EncodingUnavailable(format!("{}: {}", kind, reason));
                log.push(format!("{} backend unavailable, using fallback encoding", kind));
                cause
            }
            Capability::Supported => match encoder.encode(grid, target) {
                Ok(artifacts) => return artifacts,
                Err(e) => {
                    warn!("{} export failed: {}", kind, e);
                    log.push(format!("Error creating {}: {}", kind, e));
                    e
                }
            },
        };

        match encoder.fallback(grid, target, &cause) {
            Some(Ok(artifacts)) => {
                log.push(format!("Wrote fallback {}", kind));
                artifacts
            }
            Some(Err(e)) => {
                warn!("{} fallback failed: {}", kind, e);
                log.push(format!("Fallback {} failed: {}", kind, e));
                Vec::new()
            }
            None => {
                log.push(format!("Skipped {}", kind));
                Vec::new()
            }
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}
