// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Training entry point
//!
//! Fits the abalone pipeline on the configured dataset, reports held-out
//! metrics and writes the artifact the prediction service loads.

use age_model::{ArtifactStore, TrainingConfig, data, run_training};
use anyhow::{Context, Result};
use shared_types::FeatureContract;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TrainingConfig::from_env()?;
    let contract = FeatureContract::abalone();

    let report = run_training(&config, &contract)
        .await
        .context("training run failed")?;
    info!(metrics = %report.metrics, rows = report.rows, "model trained");

    // Smoke check: the persisted artifact must load and predict the dataset
    let artifact = ArtifactStore::new(contract.clone())
        .load(&report.artifact_path)
        .await
        .context("freshly written artifact failed to load")?;
    let features = data::load_features(&config.dataset_path, &contract)?;
    let predictions = artifact.pipeline.predict_batch(&features)?;
    info!(
        predictions = predictions.len(),
        first = predictions.first().copied(),
        "artifact verified"
    );

    Ok(())
}
