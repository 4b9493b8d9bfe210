// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the model lifecycle
//!
//! Data, training and artifact errors are fatal for the operation that raised
//! them and are never retried here. Validation and contract errors are client
//! faults scoped to a single request or row.

use std::path::{Path, PathBuf};

use shared_types::{ContractError, ValidationError};
use thiserror::Error;

/// Result type alias for model lifecycle operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for data loading, training, persistence and inference
#[derive(Debug, Error)]
pub enum ModelError {
    /// Training data source does not exist
    #[error("Dataset not found: {}", path.display())]
    DataNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Training data is malformed (missing columns, unreadable records)
    #[error("Data format error: {message}")]
    DataFormat {
        /// Error message
        message: String,
    },

    /// A dataset row violates the feature contract
    #[error("Invalid dataset row {line}: {source}")]
    InvalidRow {
        /// 1-based line number in the source file
        line: u64,
        /// The contract violation
        #[source]
        source: ValidationError,
    },

    /// Request violates the feature contract
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request carries names the feature contract does not know
    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    /// Fitting the pipeline failed
    #[error("Training error: {message}")]
    Training {
        /// Error message
        message: String,
    },

    /// Metrics could not be computed
    #[error("Evaluation error: {message}")]
    Evaluation {
        /// Error message
        message: String,
    },

    /// No artifact at the configured path
    #[error("Artifact not found: {}", path.display())]
    ArtifactNotFound {
        /// Artifact path
        path: PathBuf,
    },

    /// The artifact exists but cannot be decoded into a pipeline
    #[error("Artifact at {} is corrupt: {message}", path.display())]
    ArtifactCorrupt {
        /// Artifact path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Reading or writing the artifact failed at the I/O level
    #[error("Artifact I/O error at {}: {message}", path.display())]
    ArtifactIo {
        /// Artifact path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// A prediction was requested while no model is loaded
    #[error("Model not loaded: {reason}")]
    ModelNotLoaded {
        /// Why the model is unavailable
        reason: String,
    },

    /// The loaded pipeline failed to produce a prediction
    #[error("Inference error: {message}")]
    Inference {
        /// Error message
        message: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },
}

impl ModelError {
    /// Create a data format error
    pub fn data_format<T: ToString>(message: T) -> Self {
        Self::DataFormat {
            message: message.to_string(),
        }
    }

    /// Create a training error
    pub fn training<T: ToString>(message: T) -> Self {
        Self::Training {
            message: message.to_string(),
        }
    }

    /// Create an evaluation error
    pub fn evaluation<T: ToString>(message: T) -> Self {
        Self::Evaluation {
            message: message.to_string(),
        }
    }

    /// Create an inference error
    pub fn inference<T: ToString>(message: T) -> Self {
        Self::Inference {
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create an artifact corruption error
    pub fn artifact_corrupt<T: ToString>(path: &Path, message: T) -> Self {
        Self::ArtifactCorrupt {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Create an artifact I/O error
    pub fn artifact_io<T: ToString>(path: &Path, message: T) -> Self {
        Self::ArtifactIo {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Check if the caller supplied bad input
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Contract(_))
    }

    /// Check if this error concerns the persisted artifact
    pub fn is_artifact_error(&self) -> bool {
        matches!(
            self,
            Self::ArtifactNotFound { .. } | Self::ArtifactCorrupt { .. } | Self::ArtifactIo { .. }
        )
    }

    /// Check if this error aborts a training run
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::DataNotFound { .. } | Self::DataFormat { .. } | Self::InvalidRow { .. }
        )
    }
}

impl From<csv::Error> for ModelError {
    fn from(err: csv::Error) -> Self {
        Self::DataFormat {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for ModelError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use shared_types::ValidationReason;

    use super::*;

    #[test]
    fn error_classification() {
        let validation = ModelError::from(ValidationError::new("sex", ValidationReason::Missing));
        assert!(validation.is_client_fault());
        assert!(!validation.is_artifact_error());

        let contract = ModelError::from(ContractError::UnknownFeature {
            name: "rings".to_string(),
        });
        assert!(contract.is_client_fault());

        let corrupt = ModelError::artifact_corrupt(Path::new("model.json"), "truncated");
        assert!(corrupt.is_artifact_error());
        assert!(!corrupt.is_client_fault());

        let missing = ModelError::DataNotFound {
            path: PathBuf::from("abalone.csv"),
        };
        assert!(missing.is_data_error());
        assert!(!missing.is_artifact_error());
    }

    #[test]
    fn validation_display_is_transparent() {
        let error = ModelError::from(ValidationError::new("sex", ValidationReason::Missing));
        assert_eq!(error.to_string(), "invalid feature 'sex': value is missing");
    }

    #[test]
    fn error_display() {
        let error = ModelError::artifact_corrupt(Path::new("/tmp/model.json"), "bad json");
        let display = error.to_string();
        assert!(display.contains("/tmp/model.json"));
        assert!(display.contains("bad json"));
    }
}
