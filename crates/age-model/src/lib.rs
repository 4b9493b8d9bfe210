// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Abalone age model lifecycle
//!
//! This crate turns the raw abalone measurements into a persisted, servable
//! regression pipeline and serves predictions from it. Training and serving
//! both go through the [`shared_types::FeatureContract`], so the feature
//! layout the pipeline was fitted on is exactly the layout it is queried with.
//!
//! # Module Structure
//!
//! - [`data`]: dataset loading, target derivation, leakage removal, seeded split
//! - [`transform`]: one-hot encoding and standardization, fitted on training rows only
//! - [`regression`]: least-squares estimator
//! - [`trainer`]: fits transform and estimator as one unit
//! - [`pipeline`]: the immutable fitted pipeline
//! - [`evaluation`]: MAE, RMSE and R² on the held-out partition
//! - [`artifact`]: atomic persistence of fitted pipelines
//! - [`inference`]: request validation and prediction against the loaded artifact
//! - [`config`]: layered training configuration
//! - [`training`]: end-to-end training run
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use age_model::{InferenceService, TrainingConfig, run_training};
//! use shared_types::{AbaloneFeatures, FeatureContract, FeatureRow, Sex};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let contract = FeatureContract::abalone();
//! let config = TrainingConfig::from_env()?;
//! let report = run_training(&config, &contract).await?;
//! println!("held-out {}", report.metrics);
//!
//! let service = InferenceService::new(contract, &config.artifact_path);
//! let request = FeatureRow::from(&AbaloneFeatures {
//!     sex: Sex::Female,
//!     length: 0.53,
//!     diameter: 0.42,
//!     height: 0.135,
//!     whole_weight: 0.677,
//!     shucked_weight: 0.2565,
//!     viscera_weight: 0.1415,
//!     shell_weight: 0.21,
//! });
//! let prediction = service.predict(&request).await?;
//! println!("{} rings, {} years", prediction.predicted_rings, prediction.predicted_age);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod inference;
pub mod pipeline;
pub mod regression;
pub mod trainer;
pub mod training;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use artifact::{Artifact, ArtifactStore};
pub use config::{TestFraction, TrainingConfig};
pub use error::{ModelError, ModelResult};
pub use evaluation::{Metrics, evaluate};
pub use inference::{InferenceService, ModelInfo, ModelStatus};
pub use pipeline::{FittedPipeline, MODEL_TYPE};
pub use trainer::Trainer;
pub use training::{TrainingReport, run_training};
pub use transform::{TransformSpec, build_transform_spec};
