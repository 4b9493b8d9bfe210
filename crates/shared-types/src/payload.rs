// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request and response payloads of the prediction service

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    contract::{AGE_OFFSET, FeatureRow, FeatureValue},
    sex::Sex,
};

/// Physical measurements of a single abalone
///
/// This is the typed form of a prediction request. The service accepts the
/// same shape as a loose JSON object so that bad values can be reported per
/// field by the feature contract rather than as a generic parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "sex": "M",
    "length": 0.455,
    "diameter": 0.365,
    "height": 0.095,
    "whole_weight": 0.514,
    "shucked_weight": 0.2245,
    "viscera_weight": 0.101,
    "shell_weight": 0.15
}))]
pub struct AbaloneFeatures {
    /// Sex of the abalone: M (male), F (female), I (infant)
    pub sex: Sex,
    /// Longest shell measurement, in [0, 1]
    pub length: f64,
    /// Perpendicular to length, in [0, 1]
    pub diameter: f64,
    /// With meat in shell, in [0, 1]
    pub height: f64,
    /// Whole abalone, >= 0
    pub whole_weight: f64,
    /// Weight of meat, >= 0
    pub shucked_weight: f64,
    /// Gut weight after bleeding, >= 0
    pub viscera_weight: f64,
    /// Shell weight after drying, >= 0
    pub shell_weight: f64,
}

impl From<&AbaloneFeatures> for FeatureRow {
    fn from(features: &AbaloneFeatures) -> Self {
        Self::from([
            ("sex".to_string(), FeatureValue::from(features.sex.code())),
            ("length".to_string(), features.length.into()),
            ("diameter".to_string(), features.diameter.into()),
            ("height".to_string(), features.height.into()),
            ("whole_weight".to_string(), features.whole_weight.into()),
            ("shucked_weight".to_string(), features.shucked_weight.into()),
            ("viscera_weight".to_string(), features.viscera_weight.into()),
            ("shell_weight".to_string(), features.shell_weight.into()),
        ])
    }
}

/// Prediction result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"predicted_rings": 8.5, "predicted_age": 10.0}))]
pub struct PredictionResponse {
    /// Predicted number of shell rings
    pub predicted_rings: f64,
    /// Predicted age in years (rings + 1.5)
    pub predicted_age: f64,
}

impl PredictionResponse {
    /// Build a response from a ring prediction, deriving the age
    pub fn from_rings(predicted_rings: f64) -> Self {
        Self {
            predicted_rings,
            predicted_age: predicted_rings + AGE_OFFSET,
        }
    }
}

/// Introspection view of the feature contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContractDescription {
    /// External feature names, in contract order
    pub features: Vec<String>,
    /// Name of the predicted quantity
    pub target: String,
    /// Name of the derived reporting quantity
    pub derived: String,
}
