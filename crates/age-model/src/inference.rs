// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Inference service
//!
//! Owns the feature contract and a shared handle to the loaded artifact.
//! Predictions clone the handle under a short read lock and then run without
//! any lock held, so a concurrent reload never exposes a half-swapped model:
//! each request completes entirely against the artifact it started with.
//!
//! State machine: `Uninitialized` moves to `Loaded` or `FailedToLoad` on the
//! first load (at startup or on first use). Loading is never retried
//! implicitly; [`InferenceService::reload`] is the only way out of
//! `FailedToLoad` and the only way to replace a loaded model.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{ContractDescription, FeatureContract, FeatureRow, PredictionResponse};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    artifact::{Artifact, ArtifactStore},
    error::{ModelError, ModelResult},
    pipeline::MODEL_TYPE,
};

/// Externally visible lifecycle state of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// No load has been attempted yet
    Uninitialized,
    /// A verified artifact is serving predictions
    Loaded,
    /// The last load attempt failed and no model is available
    FailedToLoad,
}

impl ModelStatus {
    /// Snake-case name of the state
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loaded => "loaded",
            Self::FailedToLoad => "failed_to_load",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum ModelState {
    Uninitialized,
    Loaded(Arc<Artifact>),
    FailedToLoad(String),
}

impl ModelState {
    fn status(&self) -> ModelStatus {
        match self {
            Self::Uninitialized => ModelStatus::Uninitialized,
            Self::Loaded(_) => ModelStatus::Loaded,
            Self::FailedToLoad(_) => ModelStatus::FailedToLoad,
        }
    }
}

/// Introspection snapshot of the service; building it never touches the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Estimator family
    pub model_type: String,
    /// Feature names and target/derived names
    pub contract: ContractDescription,
    /// Configured artifact location
    pub artifact_path: PathBuf,
    /// Lifecycle state
    pub status: ModelStatus,
    /// When the loaded artifact was trained
    pub trained_at: Option<DateTime<Utc>>,
    /// Why the last load failed, when in `FailedToLoad`
    pub error: Option<String>,
}

/// Validates requests and serves predictions from the loaded artifact
#[derive(Debug)]
pub struct InferenceService {
    contract: FeatureContract,
    store: ArtifactStore,
    artifact_path: PathBuf,
    state: RwLock<ModelState>,
    load_lock: Mutex<()>,
}

impl InferenceService {
    /// Create an uninitialized service for the artifact at `artifact_path`
    pub fn new(contract: FeatureContract, artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            store: ArtifactStore::new(contract.clone()),
            contract,
            artifact_path: artifact_path.into(),
            state: RwLock::new(ModelState::Uninitialized),
            load_lock: Mutex::new(()),
        }
    }

    /// The feature contract requests are validated against
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Configured artifact location
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Current lifecycle state
    pub fn status(&self) -> ModelStatus {
        self.state.read().status()
    }

    /// Handle to the currently loaded artifact, if any
    pub fn current(&self) -> Option<Arc<Artifact>> {
        match &*self.state.read() {
            ModelState::Loaded(artifact) => Some(Arc::clone(artifact)),
            _ => None,
        }
    }

    /// Describe the contract, artifact path and state without invoking the model
    pub fn info(&self) -> ModelInfo {
        let state = self.state.read();
        let (trained_at, error) = match &*state {
            ModelState::Loaded(artifact) => (Some(artifact.created_at), None),
            ModelState::FailedToLoad(reason) => (None, Some(reason.clone())),
            ModelState::Uninitialized => (None, None),
        };

        ModelInfo {
            model_type: MODEL_TYPE.to_string(),
            contract: self.contract.describe(),
            artifact_path: self.artifact_path.clone(),
            status: state.status(),
            trained_at,
            error,
        }
    }

    /// Perform the initial load if it has not been attempted yet
    ///
    /// Concurrent callers wait for a single load. Once loaded, the cached
    /// artifact is returned without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns the artifact error on a failed first load, or
    /// `ModelError::ModelNotLoaded` if a previous load already failed.
    pub async fn ensure_loaded(&self) -> ModelResult<Arc<Artifact>> {
        if let Some(artifact) = self.loaded_or_failed()? {
            return Ok(artifact);
        }

        let _guard = self.load_lock.lock().await;
        if let Some(artifact) = self.loaded_or_failed()? {
            return Ok(artifact);
        }

        self.load_and_publish().await
    }

    fn loaded_or_failed(&self) -> ModelResult<Option<Arc<Artifact>>> {
        match &*self.state.read() {
            ModelState::Loaded(artifact) => Ok(Some(Arc::clone(artifact))),
            ModelState::FailedToLoad(reason) => Err(ModelError::ModelNotLoaded {
                reason: reason.clone(),
            }),
            ModelState::Uninitialized => Ok(None),
        }
    }

    /// Load the artifact again and atomically replace the served model
    ///
    /// The new pipeline is fully loaded and verified before it is published.
    /// On failure a previously loaded model keeps serving; without one the
    /// service moves to `FailedToLoad`.
    ///
    /// # Errors
    ///
    /// Returns the artifact error that prevented the reload.
    pub async fn reload(&self) -> ModelResult<ModelInfo> {
        let _guard = self.load_lock.lock().await;
        self.load_and_publish().await?;
        Ok(self.info())
    }

    #[instrument(skip(self), fields(path = %self.artifact_path.display()))]
    async fn load_and_publish(&self) -> ModelResult<Arc<Artifact>> {
        match self.store.load(&self.artifact_path).await {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                *self.state.write() = ModelState::Loaded(Arc::clone(&artifact));
                info!(trained_at = %artifact.created_at, "model loaded");
                Ok(artifact)
            }
            Err(err) => {
                let mut state = self.state.write();
                if matches!(*state, ModelState::Loaded(_)) {
                    warn!(error = %err, "reload failed, keeping previous model");
                } else {
                    error!(error = %err, "model failed to load");
                    *state = ModelState::FailedToLoad(err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Validate `request`, run the pipeline and derive the age
    ///
    /// `request` is keyed by external feature names.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Validation` or `ModelError::Contract` for a bad
    /// request, `ModelError::ModelNotLoaded` (or the artifact error of a
    /// failed first load) if no model is available, and
    /// `ModelError::Inference` if the pipeline fails.
    pub async fn predict(&self, request: &FeatureRow) -> ModelResult<PredictionResponse> {
        self.contract.validate(request)?;
        let internal = self.contract.to_internal(request)?;
        let features = self.contract.vectorize(&internal)?;

        let artifact = self.ensure_loaded().await.map_err(|err| {
            if err.is_artifact_error() {
                ModelError::ModelNotLoaded {
                    reason: err.to_string(),
                }
            } else {
                err
            }
        })?;

        let rings = artifact.pipeline.predict(&features)?;
        debug!(rings, "prediction served");
        Ok(PredictionResponse::from_rings(rings))
    }
}
