// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Artifact store
//!
//! A fitted pipeline is persisted as a single self-describing JSON document.
//! Writes go to a uniquely named temporary file in the destination directory,
//! are flushed to disk and then renamed over the target, so readers only ever
//! observe the previous complete artifact or the new complete one. The
//! directory is synced after the rename so the swap survives a crash.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::FeatureContract;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{ModelError, ModelResult},
    pipeline::{FittedPipeline, MODEL_TYPE},
};

/// Version of the artifact document layout
pub const FORMAT_VERSION: u32 = 1;

/// Persisted form of a fitted pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Document layout version
    pub format_version: u32,
    /// Estimator family
    pub model_type: String,
    /// When the pipeline was fitted
    pub created_at: DateTime<Utc>,
    /// Internal feature names the pipeline was trained on, in contract order
    pub features: Vec<String>,
    /// The fitted pipeline itself
    pub pipeline: FittedPipeline,
}

impl Artifact {
    /// Wrap a freshly fitted pipeline for the given contract
    pub fn new(pipeline: FittedPipeline, contract: &FeatureContract) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            model_type: MODEL_TYPE.to_string(),
            created_at: Utc::now(),
            features: contract
                .internal_names()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            pipeline,
        }
    }

    /// Check that the document matches this build and `contract`
    fn verify(&self, contract: &FeatureContract) -> Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.model_type != MODEL_TYPE {
            return Err(format!("unsupported model type '{}'", self.model_type));
        }
        if self.features != contract.internal_names() {
            return Err(format!(
                "trained on features [{}], current contract declares [{}]",
                self.features.join(", "),
                contract.internal_names().join(", ")
            ));
        }

        let transformer = &self.pipeline.transformer;
        let encoded: Vec<_> = transformer.encoders.iter().map(|e| e.feature.as_str()).collect();
        let categorical: Vec<_> = contract.categorical().map(|spec| spec.internal).collect();
        let numerical: Vec<_> = contract.numerical().map(|spec| spec.internal).collect();
        if encoded != categorical || transformer.scaler.features != numerical {
            return Err("transform stage does not match the feature list".to_string());
        }
        if transformer.scaler.mean.len() != numerical.len()
            || transformer.scaler.scale.len() != numerical.len()
        {
            return Err("scaler statistics do not match the feature list".to_string());
        }
        if self.pipeline.estimator.coefficients.len() != self.pipeline.width() {
            return Err(format!(
                "estimator has {} coefficients for {} transformed columns",
                self.pipeline.estimator.coefficients.len(),
                self.pipeline.width()
            ));
        }

        let estimator = &self.pipeline.estimator;
        let mut parameters = transformer
            .scaler
            .mean
            .iter()
            .chain(&transformer.scaler.scale)
            .chain(&estimator.coefficients)
            .chain(std::iter::once(&estimator.intercept));
        if parameters.any(|v| !v.is_finite()) {
            return Err("pipeline parameters contain non-finite values".to_string());
        }
        Ok(())
    }
}

/// Reads and writes artifacts for one feature contract
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    contract: FeatureContract,
}

impl ArtifactStore {
    /// Create a store validating artifacts against `contract`
    pub fn new(contract: FeatureContract) -> Self {
        Self { contract }
    }

    /// Persist `pipeline` at `path`, atomically replacing any previous artifact
    ///
    /// Parent directories are created if absent.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ArtifactCorrupt` if the pipeline holds non-finite
    /// parameters and `ModelError::ArtifactIo` if any filesystem step fails;
    /// either way the previous artifact at `path`, if any, is left untouched.
    #[instrument(skip(self, pipeline), fields(path = %path.display()))]
    pub async fn save(&self, pipeline: &FittedPipeline, path: &Path) -> ModelResult<Artifact> {
        let artifact = Artifact::new(pipeline.clone(), &self.contract);
        // JSON has no encoding for non-finite floats; such a document would never load back
        artifact
            .verify(&self.contract)
            .map_err(|message| ModelError::artifact_corrupt(path, message))?;
        let bytes = serde_json::to_vec_pretty(&artifact)
            .map_err(|err| ModelError::artifact_io(path, err))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| ModelError::artifact_io(path, "path has no file name"))?;
        let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(directory) = directory {
            fs::create_dir_all(directory)
                .await
                .map_err(|err| ModelError::artifact_io(directory, err))?;
        }

        let temp_name = format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            uuid::Uuid::new_v4().simple()
        );
        let temp_path = directory.map_or_else(|| PathBuf::from(&temp_name), |d| d.join(&temp_name));

        if let Err(err) = write_synced(&temp_path, &bytes).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                debug!(path = %temp_path.display(), error = %cleanup, "temporary artifact not removed");
            }
            return Err(ModelError::artifact_io(path, err));
        }

        if let Err(err) = fs::rename(&temp_path, path).await {
            warn!(error = %err, "failed to move artifact into place");
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                debug!(path = %temp_path.display(), error = %cleanup, "temporary artifact not removed");
            }
            return Err(ModelError::artifact_io(path, err));
        }

        let synced = directory.unwrap_or(Path::new("."));
        if let Err(err) = sync_directory(synced).await {
            warn!(directory = %synced.display(), error = %err, "artifact directory not synced");
        }

        info!(bytes = bytes.len(), "saved artifact");
        Ok(artifact)
    }

    /// Load and verify the artifact at `path`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ArtifactNotFound` if nothing exists at `path`,
    /// `ModelError::ArtifactIo` if it cannot be read, and
    /// `ModelError::ArtifactCorrupt` if it does not decode or does not match
    /// the feature contract.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn load(&self, path: &Path) -> ModelResult<Artifact> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModelError::ArtifactNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => return Err(ModelError::artifact_io(path, err)),
        };

        let artifact: Artifact =
            serde_json::from_slice(&bytes).map_err(|err| ModelError::artifact_corrupt(path, err))?;
        artifact
            .verify(&self.contract)
            .map_err(|message| ModelError::artifact_corrupt(path, message))?;

        info!(
            created_at = %artifact.created_at,
            model_type = %artifact.model_type,
            "loaded artifact"
        );
        Ok(artifact)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

async fn sync_directory(directory: &Path) -> std::io::Result<()> {
    if cfg!(unix) {
        fs::File::open(directory).await?.sync_all().await
    } else {
        Ok(())
    }
}
