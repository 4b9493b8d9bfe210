// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the prediction server,
//! including configuration, the inference service, and coordinated cancellation.

use std::sync::Arc;

use age_model::{InferenceService, ModelStatus};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::config::{Environment, ServerConfig};

const HEALTHY: &str = "healthy";
const HEALTH_MESSAGE: &str = "abalone age prediction service is running";

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Inference service holding the loaded model
    inference: Arc<InferenceService>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `inference` - Inference service shared by all handlers
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        inference: Arc<InferenceService>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            inference,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Inference service used by the prediction routes
    pub fn inference(&self) -> &Arc<InferenceService> {
        &self.inference
    }

    /// Liveness report
    ///
    /// The service reports healthy whenever it can answer, including before a
    /// model has been loaded; the model state is reported alongside.
    pub fn health_check(&self) -> HealthCheck {
        HealthCheck {
            status: Box::from(HEALTHY),
            message: Box::from(HEALTH_MESSAGE),
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            model_state: self.inference.status().into(),
        }
    }
}

/// Model lifecycle state as reported over HTTP
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    /// No load has been attempted yet
    Uninitialized,
    /// A model is loaded and serving predictions
    Loaded,
    /// The last load failed and no model is available
    FailedToLoad,
}

impl From<ModelStatus> for ModelState {
    fn from(status: ModelStatus) -> Self {
        match status {
            ModelStatus::Uninitialized => Self::Uninitialized,
            ModelStatus::Loaded => Self::Loaded,
            ModelStatus::FailedToLoad => Self::FailedToLoad,
        }
    }
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status, always `healthy` when the server answers
    #[schema(value_type = String, example = "healthy")]
    pub status: Box<str>,
    /// Human-readable status message
    #[schema(value_type = String)]
    pub message: Box<str>,
    /// Service version
    #[schema(value_type = String)]
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// State of the prediction model
    pub model_state: ModelState,
}
