use crate::dem_pipeline::common::{DemError, ElevationGrid, Result};
use crate::dem_pipeline::export::types::{ArtifactKind, Capability, JobTarget, OutputArtifact};

pub trait ArtifactEncoder {
    fn kind(&self) -> ArtifactKind;

    /// Line appended to the job log before the encoder runs.
    fn stage_message(&self) -> String;

    /// Whether the primary backend can run in this build and configuration.
    fn capability(&self) -> Capability {
        Capability::Supported
    }

    fn encode(&self, grid: &ElevationGrid, target: &JobTarget) -> Result<Vec<OutputArtifact>>;

    /// Substitute output after `encode` failed or the backend is unsupported.
    /// `None` means the artifact is omitted.
    fn fallback(
        &self,
        _grid: &ElevationGrid,
        _target: &JobTarget,
        _cause: &DemError,
    ) -> Option<Result<Vec<OutputArtifact>>> {
        None
    }
}
