// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Held-out evaluation

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_types::FeatureVector;

use crate::{
    error::{ModelError, ModelResult},
    pipeline::FittedPipeline,
};

/// Accuracy of a pipeline on a held-out partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MAE={:.4} RMSE={:.4} R2={:.4}", self.mae, self.rmse, self.r2)
    }
}

/// Run the pipeline once over `features` and score it against `targets`
///
/// # Errors
///
/// Returns `ModelError::Inference` if prediction fails and
/// `ModelError::Evaluation` if the metrics cannot be computed.
pub fn evaluate(
    pipeline: &FittedPipeline,
    features: &[FeatureVector],
    targets: &[f64],
) -> ModelResult<Metrics> {
    let predictions = pipeline.predict_batch(features)?;
    score(&predictions, targets)
}

/// Compute MAE, RMSE and R² of `predictions` against `targets`
///
/// R² is 1 for a constant target predicted exactly and 0 for a constant
/// target predicted with any error.
///
/// # Errors
///
/// Returns `ModelError::Evaluation` if the slices are empty or of different lengths.
pub fn score(predictions: &[f64], targets: &[f64]) -> ModelResult<Metrics> {
    if predictions.is_empty() {
        return Err(ModelError::evaluation("no predictions to score"));
    }
    if predictions.len() != targets.len() {
        return Err(ModelError::evaluation(format!(
            "{} predictions for {} targets",
            predictions.len(),
            targets.len()
        )));
    }

    #[allow(clippy::cast_precision_loss)]
    let n = targets.len() as f64;
    let mean = targets.iter().sum::<f64>() / n;

    let mut abs_error = 0.0;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (predicted, actual) in predictions.iter().zip(targets) {
        let residual = actual - predicted;
        abs_error += residual.abs();
        ss_res += residual * residual;
        ss_tot += (actual - mean).powi(2);
    }

    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    Ok(Metrics {
        mae: abs_error / n,
        rmse: (ss_res / n).sqrt(),
        r2,
    })
}
