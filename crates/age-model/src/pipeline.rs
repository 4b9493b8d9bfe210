// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! The fitted transform + estimator unit

use serde::{Deserialize, Serialize};
use shared_types::FeatureVector;

use crate::{
    error::{ModelError, ModelResult},
    regression::LinearRegression,
    transform::FittedTransformer,
};

/// Estimator family persisted in artifacts and reported by the service
pub const MODEL_TYPE: &str = "linear_regression";

/// Immutable composition of a fitted transformer and a fitted estimator
///
/// Produced once per training run by [`crate::trainer::Trainer`]. Neither
/// stage is ever refitted or mutated afterwards, so a pipeline can be shared
/// across any number of concurrent predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    /// Encoding and scaling stage
    pub transformer: FittedTransformer,
    /// Linear estimator over the transformed features
    pub estimator: LinearRegression,
}

impl FittedPipeline {
    /// Number of transformed columns the estimator expects
    pub fn width(&self) -> usize {
        self.transformer.output_width()
    }

    /// Predict ring counts for a batch of rows
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Inference` if a row cannot be transformed or the
    /// estimator produces a non-finite value.
    pub fn predict_batch(&self, rows: &[FeatureVector]) -> ModelResult<Vec<f64>> {
        let design = self.transformer.transform(rows)?;
        let predictions = self.estimator.predict(&design)?;

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::inference("model produced a non-finite prediction"));
        }
        Ok(predictions.to_vec())
    }

    /// Predict the ring count of a single row
    ///
    /// # Errors
    ///
    /// See [`Self::predict_batch`].
    pub fn predict(&self, row: &FeatureVector) -> ModelResult<f64> {
        self.predict_batch(std::slice::from_ref(row))?
            .first()
            .copied()
            .ok_or_else(|| ModelError::inference("model returned no prediction"))
    }
}
