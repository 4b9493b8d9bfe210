// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Feature transformation stage
//!
//! An unfit [`TransformSpec`] is built from the feature contract. Fitting it
//! on the training partition yields a [`FittedTransformer`] that one-hot
//! encodes categorical features (first level dropped) and standardizes
//! numerical features to zero mean and unit variance.

use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use shared_types::{FeatureContract, FeatureVector};

use crate::error::{ModelError, ModelResult};

/// Unfit transformation stage; holds no statistics until [`TransformSpec::fit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSpec {
    categorical: Vec<String>,
    numerical: Vec<String>,
}

/// Build the unfit transform for the given contract
pub fn build_transform_spec(contract: &FeatureContract) -> TransformSpec {
    TransformSpec {
        categorical: contract
            .categorical()
            .map(|spec| spec.internal.to_string())
            .collect(),
        numerical: contract
            .numerical()
            .map(|spec| spec.internal.to_string())
            .collect(),
    }
}

impl TransformSpec {
    /// Categorical feature names, in contract order
    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    /// Numerical feature names, in contract order
    pub fn numerical(&self) -> &[String] {
        &self.numerical
    }

    /// Learn encoding categories and scaling statistics from `rows`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Training` if `rows` is empty, if a row does not
    /// have the declared layout, or if a numerical value or its statistics
    /// are not finite.
    pub fn fit(&self, rows: &[FeatureVector]) -> ModelResult<FittedTransformer> {
        if rows.is_empty() {
            return Err(ModelError::training("cannot fit transformer on zero rows"));
        }
        check_layout(rows, self.categorical.len(), self.numerical.len())
            .map_err(ModelError::training)?;

        let encoders = self
            .categorical
            .iter()
            .enumerate()
            .map(|(i, feature)| OneHotEncoder::fit(feature, rows.iter().map(|r| &r.categorical[i])))
            .collect();

        let scaler = StandardScaler::fit(&self.numerical, rows)?;

        Ok(FittedTransformer { encoders, scaler })
    }
}

fn check_layout(rows: &[FeatureVector], categorical: usize, numerical: usize) -> Result<(), String> {
    match rows
        .iter()
        .position(|r| r.categorical.len() != categorical || r.numerical.len() != numerical)
    {
        Some(index) => Err(format!(
            "row {index} has {} categorical and {} numerical values, expected {categorical} and {numerical}",
            rows[index].categorical.len(),
            rows[index].numerical.len()
        )),
        None => Ok(()),
    }
}

/// One-hot encoding of a single categorical feature, first category dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Feature name
    pub feature: String,
    /// Sorted categories seen during fitting; the first one is the reference level
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    fn fit<'a>(feature: &str, values: impl Iterator<Item = &'a String>) -> Self {
        let categories: BTreeSet<_> = values.cloned().collect();
        Self {
            feature: feature.to_string(),
            categories: categories.into_iter().collect(),
        }
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.categories.len().saturating_sub(1)
    }

    fn encode(&self, value: &str, out: &mut Vec<f64>) -> ModelResult<()> {
        let index = self
            .categories
            .iter()
            .position(|c| c == value)
            .ok_or_else(|| {
                ModelError::inference(format!(
                    "category '{value}' of feature '{}' was not seen during training",
                    self.feature
                ))
            })?;

        out.extend((1..self.categories.len()).map(|i| if i == index { 1.0 } else { 0.0 }));
        Ok(())
    }
}

/// Per-feature standardization with population statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Feature names
    pub features: Vec<String>,
    /// Training means
    pub mean: Vec<f64>,
    /// Training standard deviations, 1 for zero-variance features
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn fit(features: &[String], rows: &[FeatureVector]) -> ModelResult<Self> {
        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;
        let mut mean = vec![0.0; features.len()];
        let mut scale = vec![0.0; features.len()];

        for (j, feature) in features.iter().enumerate() {
            let column = rows.iter().map(|r| r.numerical[j]);
            if column.clone().any(|v| !v.is_finite()) {
                return Err(ModelError::training(format!(
                    "feature '{feature}' has non-finite values"
                )));
            }

            let mu = column.clone().sum::<f64>() / n;
            let variance = column.map(|v| (v - mu).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            if !mu.is_finite() || !std.is_finite() {
                return Err(ModelError::training(format!(
                    "feature '{feature}' statistics overflow (mean {mu}, std {std})"
                )));
            }

            mean[j] = mu;
            scale[j] = if std > 0.0 { std } else { 1.0 };
        }

        Ok(Self {
            features: features.to_vec(),
            mean,
            scale,
        })
    }

    fn scale_into(&self, values: &[f64], out: &mut Vec<f64>) {
        out.extend(
            values
                .iter()
                .zip(self.mean.iter().zip(&self.scale))
                .map(|(v, (mu, s))| (v - mu) / s),
        );
    }
}

/// Transformation stage fitted on the training partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransformer {
    /// One encoder per categorical feature
    pub encoders: Vec<OneHotEncoder>,
    /// Scaler over the numerical features
    pub scaler: StandardScaler,
}

impl FittedTransformer {
    /// Number of columns in the transformed design matrix
    pub fn output_width(&self) -> usize {
        self.encoders.iter().map(OneHotEncoder::width).sum::<usize>() + self.scaler.features.len()
    }

    /// Transform rows into a design matrix: encoded categoricals, then scaled numericals
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Inference` for a row with the wrong layout or a
    /// category not seen during fitting.
    pub fn transform(&self, rows: &[FeatureVector]) -> ModelResult<Array2<f64>> {
        check_layout(rows, self.encoders.len(), self.scaler.features.len())
            .map_err(ModelError::inference)?;

        let width = self.output_width();
        let mut values = Vec::with_capacity(rows.len() * width);
        for row in rows {
            for (encoder, value) in self.encoders.iter().zip(&row.categorical) {
                encoder.encode(value, &mut values)?;
            }
            self.scaler.scale_into(&row.numerical, &mut values);
        }

        Array2::from_shape_vec((rows.len(), width), values).map_err(ModelError::inference)
    }
}
