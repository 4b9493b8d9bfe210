// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Fixtures shared by unit tests

use shared_types::{FeatureContract, FeatureRow, FeatureValue, FeatureVector};

use crate::{pipeline::FittedPipeline, trainer::Trainer, transform::build_transform_spec};

/// Twelve rows from the abalone dataset with their ring counts
pub(crate) fn abalone_rows() -> (Vec<FeatureVector>, Vec<f64>) {
    let features = [
        ("M", [0.455, 0.365, 0.095, 0.514, 0.2245, 0.101, 0.15]),
        ("M", [0.35, 0.265, 0.09, 0.2255, 0.0995, 0.0485, 0.07]),
        ("F", [0.53, 0.42, 0.135, 0.677, 0.2565, 0.1415, 0.21]),
        ("M", [0.44, 0.365, 0.125, 0.516, 0.2155, 0.114, 0.155]),
        ("I", [0.33, 0.255, 0.08, 0.205, 0.0895, 0.0395, 0.055]),
        ("I", [0.425, 0.3, 0.095, 0.3515, 0.141, 0.0775, 0.12]),
        ("F", [0.53, 0.415, 0.15, 0.7775, 0.237, 0.1415, 0.33]),
        ("F", [0.545, 0.425, 0.125, 0.768, 0.294, 0.1495, 0.26]),
        ("M", [0.475, 0.37, 0.125, 0.5095, 0.2165, 0.1125, 0.165]),
        ("F", [0.55, 0.44, 0.15, 0.8945, 0.3145, 0.151, 0.32]),
        ("F", [0.525, 0.38, 0.14, 0.6065, 0.194, 0.1475, 0.21]),
        ("M", [0.43, 0.35, 0.11, 0.406, 0.1675, 0.081, 0.135]),
    ]
    .into_iter()
    .map(|(sex, numerical)| FeatureVector {
        categorical: vec![sex.to_string()],
        numerical: numerical.to_vec(),
    })
    .collect();
    let rings = vec![
        15.0, 7.0, 9.0, 10.0, 7.0, 8.0, 20.0, 16.0, 9.0, 19.0, 14.0, 10.0,
    ];
    (features, rings)
}

/// Pipeline fitted on [`abalone_rows`] with every ring count shifted by `offset`
pub(crate) fn fitted_pipeline(offset: f64) -> FittedPipeline {
    let (features, rings) = abalone_rows();
    let rings: Vec<_> = rings.into_iter().map(|r| r + offset).collect();
    Trainer::new(build_transform_spec(&FeatureContract::abalone()))
        .fit(&features, &rings)
        .expect("fixture fits")
}

/// A valid prediction request keyed by external names
pub(crate) fn request() -> FeatureRow {
    FeatureRow::from([
        ("sex".to_string(), FeatureValue::from("M")),
        ("length".to_string(), FeatureValue::from(0.455)),
        ("diameter".to_string(), FeatureValue::from(0.365)),
        ("height".to_string(), FeatureValue::from(0.095)),
        ("whole_weight".to_string(), FeatureValue::from(0.514)),
        ("shucked_weight".to_string(), FeatureValue::from(0.2245)),
        ("viscera_weight".to_string(), FeatureValue::from(0.101)),
        ("shell_weight".to_string(), FeatureValue::from(0.15)),
    ])
}
