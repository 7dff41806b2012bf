use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dem_pipeline::common::{DemError, ElevationGrid, JobLog, Result};
use crate::dem_pipeline::export::OutputArtifact;
use crate::dem_pipeline::statistics::StatisticsSummary;

/// Job state machine: `Start -> Preprocessing -> Estimating -> Exporting`,
/// ending in `Success` or `Failure`. Failure may follow any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Start,
    Preprocessing,
    Estimating,
    Exporting,
    Success,
    Failure,
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Success | JobStage::Failure)
    }

    pub fn can_transition_to(&self, next: JobStage) -> bool {
        use JobStage::*;
        match (self, next) {
            (Start, Preprocessing)
            | (Preprocessing, Estimating)
            | (Estimating, Exporting)
            | (Exporting, Success) => true,
            (current, Failure) => !current.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleStatus {
    Success,
    Failure,
}

/// Everything a job hands back to its caller.
///
/// A failure bundle never carries artifacts, statistics or an elevation grid.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBundle {
    pub job_id: String,
    pub status: BundleStatus,
    pub artifacts: Vec<OutputArtifact>,
    pub statistics: Option<StatisticsSummary>,
    pub log: JobLog,
    /// Every stage the job passed through, in order
    pub stages: Vec<JobStage>,
    pub error_message: Option<String>,
    #[serde(skip)]
    pub elevation: Option<ElevationGrid>,
}

impl ResultBundle {
    pub fn is_success(&self) -> bool {
        self.status == BundleStatus::Success
    }

    /// Artifact key to file name, the form persisted by the job store.
    pub fn output_files(&self) -> BTreeMap<String, String> {
        self.artifacts
            .iter()
            .map(|artifact| (artifact.key.clone(), artifact.file_name()))
            .collect()
    }

    pub fn artifact(&self, key: &str) -> Option<&OutputArtifact> {
        self.artifacts.iter().find(|artifact| artifact.key == key)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DemError::EncodeError(e.to_string()))
    }
}
