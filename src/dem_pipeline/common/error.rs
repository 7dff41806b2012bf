use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode input image: {0}")]
    DecodeError(String),

    #[error("Failed to encode output: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Invalid parameter {name}: {value:?} is not a number")]
    InvalidParameter { name: String, value: String },

    #[error("Encoding backend unavailable: {0}")]
    EncodingUnavailable(String),

    #[error("Export of {artifact} failed: {reason}")]
    ExportFailure { artifact: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DemError {
    /// Fatal errors abort the job; the rest are recovered inside the exporter.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DemError::InputReadError(_)
                | DemError::DecodeError(_)
                | DemError::InvalidDimensions(_, _)
                | DemError::InvalidParameter { .. }
        )
    }

    pub(crate) fn export(artifact: impl Into<String>, reason: impl ToString) -> Self {
        DemError::ExportFailure {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(DemError::DecodeError("bad".into()).is_fatal());
        assert!(DemError::InvalidDimensions(0, 3).is_fatal());
        assert!(
            DemError::InvalidParameter {
                name: "scale_factor".into(),
                value: "abc".into(),
            }
            .is_fatal()
        );
        assert!(!DemError::EncodingUnavailable("geotiff".into()).is_fatal());
        assert!(!DemError::export("surface document", "boom").is_fatal());
    }

    #[test]
    fn test_export_failure_message() {
        let err = DemError::export("ascii grid", "disk full");
        assert_eq!(err.to_string(), "Export of ascii grid failed: disk full");
    }
}
