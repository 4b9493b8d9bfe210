// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Training run configuration
//!
//! Sources are layered, later ones overriding earlier ones:
//! 1. Default values
//! 2. Optional `training.json` in the working directory
//! 3. Environment variables with the `TRAIN_` prefix (`TRAIN_DATASET_PATH`,
//!    `TRAIN_ARTIFACT_PATH`, `TRAIN_TEST_FRACTION`, `TRAIN_SEED`)

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{ModelError, ModelResult};

/// Default dataset location
pub const DEFAULT_DATASET_PATH: &str = "data/abalone.csv";

/// Default artifact location
pub const DEFAULT_ARTIFACT_PATH: &str = "models/model.json";

/// Default held-out proportion
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Default split seed
pub const DEFAULT_SEED: u64 = 42;

/// Held-out proportion, strictly between 0 and 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestFraction(f64);

impl TestFraction {
    /// Create a validated test fraction
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Configuration` unless `0 < fraction < 1`.
    pub fn new(fraction: f64) -> ModelResult<Self> {
        if fraction > 0.0 && fraction < 1.0 {
            Ok(Self(fraction))
        } else {
            Err(ModelError::config(format!(
                "test fraction must be strictly between 0 and 1, got {fraction}"
            )))
        }
    }

    /// Get the fraction
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for TestFraction {
    fn default() -> Self {
        Self(DEFAULT_TEST_FRACTION)
    }
}

impl<'de> Deserialize<'de> for TestFraction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fraction = f64::deserialize(deserializer)?;
        Self::new(fraction).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Parameters of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// CSV dataset to train on
    pub dataset_path: PathBuf,
    /// Where the fitted pipeline is written
    pub artifact_path: PathBuf,
    /// Held-out proportion for evaluation
    pub test_fraction: TestFraction,
    /// Seed of the train/test split
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            test_fraction: TestFraction::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl TrainingConfig {
    /// Load configuration from files and environment
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Configuration` if a source is malformed or a value
    /// fails validation.
    pub fn from_env() -> ModelResult<Self> {
        Self::load().map_err(|e| ModelError::config(format!("failed to load configuration: {e}")))
    }

    /// Build the layered configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("dataset_path", DEFAULT_DATASET_PATH)?
            .set_default("artifact_path", DEFAULT_ARTIFACT_PATH)?
            .set_default("test_fraction", DEFAULT_TEST_FRACTION)?
            .set_default("seed", DEFAULT_SEED)?
            .add_source(File::with_name("training.json").required(false))
            .add_source(
                Environment::with_prefix("TRAIN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_bounds_are_validated() {
        assert!(TestFraction::new(0.0).is_err());
        assert!(TestFraction::new(1.0).is_err());
        assert!(TestFraction::new(-0.2).is_err());
        assert!(TestFraction::new(f64::NAN).is_err());

        assert!(TestFraction::new(0.2).is_ok());
        assert!(TestFraction::new(0.999).is_ok());
    }

    #[test]
    fn defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.test_fraction.value(), 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.dataset_path, PathBuf::from("data/abalone.csv"));
    }

    #[test]
    fn deserialization_validates_fraction() {
        let result: Result<TrainingConfig, _> = serde_json::from_str(
            r#"{"dataset_path": "a.csv", "artifact_path": "m.json", "test_fraction": 1.5, "seed": 1}"#,
        );
        assert!(result.is_err());

        let config: TrainingConfig = serde_json::from_str(
            r#"{"dataset_path": "a.csv", "artifact_path": "m.json", "test_fraction": 0.3, "seed": 7}"#,
        )
        .expect("valid configuration");
        assert_eq!(config.test_fraction.value(), 0.3);
        assert_eq!(config.seed, 7);
    }
}
