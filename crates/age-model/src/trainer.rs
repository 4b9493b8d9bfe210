// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Trainer: fits the transform and the estimator as one unit

use ndarray::Array1;
use shared_types::FeatureVector;
use tracing::{info, instrument};

use crate::{
    error::{ModelError, ModelResult},
    pipeline::FittedPipeline,
    regression::LinearRegression,
    transform::TransformSpec,
};

/// Fits [`FittedPipeline`]s from an unfit transform specification
#[derive(Debug, Clone)]
pub struct Trainer {
    spec: TransformSpec,
}

impl Trainer {
    /// Create a trainer for the given transform specification
    pub fn new(spec: TransformSpec) -> Self {
        Self { spec }
    }

    /// Fit the transform and then the estimator on the training partition
    ///
    /// Scaling statistics and encoding categories are derived from `features`
    /// only. The result is a pure function of its inputs.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Training` if the inputs are empty or misaligned,
    /// contain non-finite values, or the estimator cannot be solved.
    #[instrument(skip_all, fields(rows = features.len()))]
    pub fn fit(&self, features: &[FeatureVector], targets: &[f64]) -> ModelResult<FittedPipeline> {
        if features.len() != targets.len() {
            return Err(ModelError::training(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }

        let transformer = self.spec.fit(features)?;
        let design = transformer
            .transform(features)
            .map_err(|err| ModelError::training(err.to_string()))?;
        let estimator = LinearRegression::fit(&design, &Array1::from(targets.to_vec()))?;

        info!(
            columns = design.ncols(),
            intercept = estimator.intercept,
            "fitted pipeline"
        );

        Ok(FittedPipeline {
            transformer,
            estimator,
        })
    }
}
