// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Abalone measurements and trained artifacts for server tests

use std::{net::SocketAddr, path::Path};

use age_model::{ArtifactStore, FittedPipeline, Trainer, build_transform_spec};
use api::{Server, ServerConfig, ShutdownConfig};
use serde_json::{Value, json};
use shared_types::{FeatureContract, FeatureVector};
use tokio_util::sync::CancellationToken;

/// Twelve rows from the abalone dataset: sex, seven measurements, rings
pub const ROWS: [(&str, [f64; 7], f64); 12] = [
    ("M", [0.455, 0.365, 0.095, 0.514, 0.2245, 0.101, 0.15], 15.0),
    ("M", [0.35, 0.265, 0.09, 0.2255, 0.0995, 0.0485, 0.07], 7.0),
    ("F", [0.53, 0.42, 0.135, 0.677, 0.2565, 0.1415, 0.21], 9.0),
    ("M", [0.44, 0.365, 0.125, 0.516, 0.2155, 0.114, 0.155], 10.0),
    ("I", [0.33, 0.255, 0.08, 0.205, 0.0895, 0.0395, 0.055], 7.0),
    ("I", [0.425, 0.3, 0.095, 0.3515, 0.141, 0.0775, 0.12], 8.0),
    ("F", [0.53, 0.415, 0.15, 0.7775, 0.237, 0.1415, 0.33], 20.0),
    ("F", [0.545, 0.425, 0.125, 0.768, 0.294, 0.1495, 0.26], 16.0),
    ("M", [0.475, 0.37, 0.125, 0.5095, 0.2165, 0.1125, 0.165], 9.0),
    ("F", [0.55, 0.44, 0.15, 0.8945, 0.3145, 0.151, 0.32], 19.0),
    ("F", [0.525, 0.38, 0.14, 0.6065, 0.194, 0.1475, 0.21], 14.0),
    ("M", [0.43, 0.35, 0.11, 0.406, 0.1675, 0.081, 0.135], 10.0),
];

/// Feature vector of row `index`
pub fn vector(index: usize) -> FeatureVector {
    let (sex, measurements, _) = ROWS[index];
    FeatureVector {
        categorical: vec![sex.to_string()],
        numerical: measurements.to_vec(),
    }
}

/// Prediction request body for row `index`, keyed by request field names
pub fn request(index: usize) -> Value {
    let (sex, m, _) = ROWS[index];
    json!({
        "sex": sex,
        "length": m[0],
        "diameter": m[1],
        "height": m[2],
        "whole_weight": m[3],
        "shucked_weight": m[4],
        "viscera_weight": m[5],
        "shell_weight": m[6],
    })
}

/// Fit a pipeline on [`ROWS`] with every ring count shifted by `offset`
pub fn fit(offset: f64) -> FittedPipeline {
    let features: Vec<_> = (0..ROWS.len()).map(vector).collect();
    let rings: Vec<_> = ROWS.iter().map(|(_, _, rings)| rings + offset).collect();
    Trainer::new(build_transform_spec(&FeatureContract::abalone()))
        .fit(&features, &rings)
        .expect("fixture rows fit")
}

/// Fit a pipeline and persist it at `path`
pub async fn write_artifact(path: &Path, offset: f64) -> FittedPipeline {
    let pipeline = fit(offset);
    ArtifactStore::new(FeatureContract::abalone())
        .save(&pipeline, path)
        .await
        .expect("artifact saves");
    pipeline
}

/// Start a server on an OS-assigned port serving the artifact at `artifact_path`
pub async fn start_server(artifact_path: &Path) -> (SocketAddr, CancellationToken) {
    let config = ServerConfig::for_testing().with_artifact_path(artifact_path);
    Server::new(config, ShutdownConfig::default())
        .expect("Failed to create server")
        .run_for_testing()
        .await
        .expect("Failed to start test server")
}
