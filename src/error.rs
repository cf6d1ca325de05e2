//! Error types for webp-sweep operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for webp-sweep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while benchmarking a parameter sweep.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The source image is missing, unreadable, or not a decodable raster.
    #[error("File access failed: {path}: {reason}")]
    FileAccess {
        /// Path that could not be opened or decoded.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// The codec rejected the parameter combination or failed while producing
    /// the artifact.
    #[error("Encode failed ({params}): {message}")]
    Encode {
        /// Parameter set identifier.
        params: String,
        /// Error message from the codec.
        message: String,
    },

    /// The codec could not decode an artifact it produced.
    #[error("Decode failed ({codec}): {message}")]
    Decode {
        /// Codec identifier.
        codec: String,
        /// Error message from the codec.
        message: String,
    },

    /// Decoded artifact dimensions differ from the source.
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height).
        expected: (usize, usize),
        /// Actual dimensions (width, height).
        actual: (usize, usize),
    },

    /// A log or artifact file could not be written or deleted.
    #[error("Persistence failed: {path}: {reason}")]
    Persistence {
        /// Path of the log or artifact.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to calculate the fidelity metric.
    #[error("Metric calculation failed: {metric}: {reason}")]
    MetricCalculation {
        /// Name of the metric that failed.
        metric: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Encoder parameter outside the accepted range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Sweep configuration or plan is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A result was recorded for a configuration that was never started.
    #[error("Unknown configuration: {0}")]
    UnknownConfiguration(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn persistence(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Whether this error stops the whole sweep rather than one configuration.
    #[must_use]
    pub fn is_fatal_for_sweep(&self) -> bool {
        matches!(
            self,
            Self::FileAccess { .. } | Self::InvalidConfig(_) | Self::InvalidParameter(_)
        )
    }

    /// Whether this error aborts the remaining iterations of one configuration
    /// while letting the sweep continue.
    #[must_use]
    pub fn is_configuration_failure(&self) -> bool {
        matches!(
            self,
            Self::Encode { .. }
                | Self::Decode { .. }
                | Self::DimensionMismatch { .. }
                | Self::MetricCalculation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagation_classes() {
        let missing = Error::FileAccess {
            path: PathBuf::from("missing.jpg"),
            reason: "not found".to_string(),
        };
        assert!(missing.is_fatal_for_sweep());
        assert!(!missing.is_configuration_failure());

        let encode = Error::Encode {
            params: "method4_q80".to_string(),
            message: "rejected".to_string(),
        };
        assert!(encode.is_configuration_failure());
        assert!(!encode.is_fatal_for_sweep());

        let mismatch = Error::DimensionMismatch {
            expected: (10, 10),
            actual: (5, 5),
        };
        assert!(mismatch.is_configuration_failure());

        let cleanup = Error::Persistence {
            path: PathBuf::from("x.webp"),
            reason: "busy".to_string(),
        };
        assert!(!cleanup.is_fatal_for_sweep());
        assert!(!cleanup.is_configuration_failure());
    }

    #[test]
    fn test_display() {
        let err = Error::DimensionMismatch {
            expected: (4, 3),
            actual: (2, 1),
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected (4, 3), got (2, 1)"
        );
    }
}
