// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Training run orchestration
//!
//! Load, derive, split, fit, evaluate, save. A run either persists a new
//! artifact or fails with nothing written.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::FeatureContract;
use tracing::{info, instrument};

use crate::{
    artifact::ArtifactStore,
    config::TrainingConfig,
    data,
    error::ModelResult,
    evaluation::{self, Metrics},
    pipeline::MODEL_TYPE,
    trainer::Trainer,
    transform::build_transform_spec,
};

/// Outcome of a successful training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Rows in the dataset
    pub rows: usize,
    /// Rows used for fitting
    pub train_rows: usize,
    /// Rows held out for evaluation
    pub test_rows: usize,
    /// Held-out accuracy
    pub metrics: Metrics,
    /// Where the artifact was written
    pub artifact_path: PathBuf,
    /// Timestamp recorded in the artifact
    pub trained_at: DateTime<Utc>,
}

/// Run the full training pipeline and persist the artifact
///
/// # Errors
///
/// Returns the first data, training, evaluation or artifact error; in every
/// error case the artifact at the configured path is left untouched.
#[instrument(skip_all, fields(
    dataset = %config.dataset_path.display(),
    test_fraction = config.test_fraction.value(),
    seed = config.seed,
    model_type = MODEL_TYPE,
))]
pub async fn run_training(
    config: &TrainingConfig,
    contract: &FeatureContract,
) -> ModelResult<TrainingReport> {
    info!("starting training run");

    let rows = data::load(&config.dataset_path, contract)?;
    let labeled = data::derive_target_and_drop_leakage(rows, contract)?;
    let split = data::split(&labeled, config.test_fraction.value(), config.seed)?;

    let trainer = Trainer::new(build_transform_spec(contract));
    let pipeline = trainer.fit(&split.train.features, &split.train.rings)?;
    let metrics = evaluation::evaluate(&pipeline, &split.test.features, &split.test.rings)?;
    info!(
        mae = metrics.mae,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "evaluated on held-out partition"
    );

    let artifact = ArtifactStore::new(contract.clone())
        .save(&pipeline, &config.artifact_path)
        .await?;

    let report = TrainingReport {
        rows: labeled.len(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        metrics,
        artifact_path: config.artifact_path.clone(),
        trained_at: artifact.created_at,
    };
    info!(
        path = %report.artifact_path.display(),
        train_rows = report.train_rows,
        test_rows = report.test_rows,
        "training run complete"
    );
    Ok(report)
}
