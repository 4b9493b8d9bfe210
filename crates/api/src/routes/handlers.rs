// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! This module provides HTTP request handlers for the prediction server:
//! liveness probes, prediction, and model introspection and reload.

use std::time::Instant;

use age_model::ModelInfo;
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{AbaloneFeatures, PredictionResponse};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    error::{ErrorResponse, ServerError},
    extractors::FeatureRowJson,
    metrics,
    state::{HealthCheck, ModelState, ServerState},
};

/// Root endpoint handler, identical to `/health`
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Service status",
    responses(
        (status = 200, description = "Service is running", body = HealthCheck)
    )
)]
pub async fn root_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check())
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns a fixed healthy status with version, environment and the current model state. Never invokes the model.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check())
}

/// Model introspection response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelInfoResponse {
    /// Estimator family of the pipeline
    #[schema(example = "linear_regression")]
    pub model_type: String,
    /// Request field names, in contract order
    pub features: Vec<String>,
    /// Name of the predicted quantity
    #[schema(example = "rings")]
    pub target: String,
    /// Name of the derived reporting quantity
    #[schema(example = "age")]
    pub derived: String,
    /// Filesystem location of the artifact
    pub artifact_path: String,
    /// Lifecycle state of the model
    pub state: ModelState,
    /// When the loaded artifact was trained
    pub trained_at: Option<DateTime<Utc>>,
    /// Reason of the last failed load
    pub error: Option<String>,
}

impl From<ModelInfo> for ModelInfoResponse {
    fn from(info: ModelInfo) -> Self {
        Self {
            model_type: info.model_type,
            features: info.contract.features,
            target: info.contract.target,
            derived: info.contract.derived,
            artifact_path: info.artifact_path.display().to_string(),
            state: info.status.into(),
            trained_at: info.trained_at,
            error: info.error,
        }
    }
}

/// Predict the ring count and age of one abalone
///
/// The body is accepted as a loose JSON object and checked against the
/// feature contract, so a bad value is reported with the name of its field.
///
/// # Errors
///
/// Returns `ServerError` with status 400 for contract violations, 503 when no
/// model can be loaded and 500 if the pipeline fails.
#[utoipa::path(
    post,
    path = "/v1/predict",
    tag = "prediction",
    summary = "Predict abalone age",
    description = "Validates the measurements against the feature contract, runs the loaded pipeline and returns the predicted ring count and the derived age (rings + 1.5).",
    request_body = AbaloneFeatures,
    responses(
        (status = 200, description = "Prediction succeeded", body = PredictionResponse),
        (status = 400, description = "A feature is missing, unknown, of the wrong kind or out of range", body = ErrorResponse),
        (status = 500, description = "The pipeline failed on a valid request", body = ErrorResponse),
        (status = 503, description = "No model is loaded", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn predict_handler(
    State(state): State<ServerState>,
    FeatureRowJson(row): FeatureRowJson,
) -> Result<Json<PredictionResponse>, ServerError> {
    let started = Instant::now();
    let result = state.inference().predict(&row).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(prediction) => {
            metrics::observe_prediction("ok", elapsed);
            Ok(Json(prediction))
        }
        Err(err) => {
            let error = ServerError::from(err);
            metrics::observe_prediction(error.kind(), elapsed);
            Err(error)
        }
    }
}

/// Describe the feature contract, artifact and model state
#[utoipa::path(
    get,
    path = "/v1/model/info",
    tag = "model",
    summary = "Model information",
    description = "Returns the model type, request feature names, target and derived names, artifact path and lifecycle state. Never invokes the model.",
    responses(
        (status = 200, description = "Model information", body = ModelInfoResponse)
    )
)]
pub async fn model_info_handler(State(state): State<ServerState>) -> Json<ModelInfoResponse> {
    Json(state.inference().info().into())
}

/// Reload the artifact from disk and swap it in
///
/// On failure the previously loaded model, if any, keeps serving.
///
/// # Errors
///
/// Returns `ServerError` with status 503 if the artifact is missing or corrupt.
#[utoipa::path(
    post,
    path = "/v1/model/reload",
    tag = "model",
    summary = "Reload the model artifact",
    responses(
        (status = 200, description = "Artifact reloaded", body = ModelInfoResponse),
        (status = 503, description = "Artifact missing or corrupt; previous model kept", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn model_reload_handler(
    State(state): State<ServerState>,
) -> Result<Json<ModelInfoResponse>, ServerError> {
    match state.inference().reload().await {
        Ok(info) => {
            metrics::record_reload("ok");
            info!(path = %info.artifact_path.display(), "model reloaded");
            Ok(Json(info.into()))
        }
        Err(err) => {
            metrics::record_reload("error");
            warn!(error = %err, "model reload failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use age_model::ModelStatus;
    use shared_types::FeatureContract;

    use super::*;

    #[test]
    fn model_info_response_flattens_contract() {
        let info = ModelInfo {
            model_type: "linear_regression".to_string(),
            contract: FeatureContract::abalone().describe(),
            artifact_path: PathBuf::from("models/model.json"),
            status: ModelStatus::FailedToLoad,
            trained_at: None,
            error: Some("artifact not found".to_string()),
        };

        let response = ModelInfoResponse::from(info);
        assert_eq!(response.features.first().map(String::as_str), Some("sex"));
        assert_eq!(response.features.len(), 8);
        assert_eq!(response.target, "rings");
        assert_eq!(response.derived, "age");
        assert_eq!(response.artifact_path, "models/model.json");
        assert_eq!(response.state, ModelState::FailedToLoad);

        let json = serde_json::to_value(&response).expect("serializes");
        assert_eq!(json["state"], "failed_to_load");
    }
}
