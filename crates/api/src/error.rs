// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides error types for server operations, including the
//! mapping of model lifecycle errors onto HTTP status codes: contract
//! violations are client faults (400), a missing or broken artifact makes the
//! service unavailable (503), and a failing pipeline is a server fault (500).

use std::net::SocketAddr;

use age_model::ModelError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// JSON parsing errors with detailed context
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },

    /// Metrics could not be exported
    #[error("Metrics error: {message}")]
    Metrics {
        /// Error message
        message: String,
    },

    /// Model lifecycle errors raised while serving a request
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::JsonError { .. } => StatusCode::BAD_REQUEST,
            Self::Model(err) => model_status_code(err),
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::TaskJoin { .. }
            | Self::Metrics { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable error kind
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::JsonError { .. } => "invalid_json",
            Self::Model(ModelError::Validation(_) | ModelError::InvalidRow { .. }) => {
                "validation_error"
            }
            Self::Model(ModelError::Contract(_)) => "unknown_feature",
            Self::Model(
                ModelError::ModelNotLoaded { .. }
                | ModelError::ArtifactNotFound { .. }
                | ModelError::ArtifactCorrupt { .. }
                | ModelError::ArtifactIo { .. },
            ) => "model_unavailable",
            Self::Model(ModelError::Inference { .. }) => "inference_error",
            _ => "internal_error",
        }
    }

    /// Name of the offending feature, for client faults that have one
    fn field(&self) -> Option<String> {
        match self {
            Self::Model(ModelError::Validation(err)) => Some(err.feature().to_string()),
            Self::Model(ModelError::Contract(shared_types::ContractError::UnknownFeature {
                name,
            })) => Some(name.clone()),
            _ => None,
        }
    }
}

fn model_status_code(err: &ModelError) -> StatusCode {
    match err {
        ModelError::Validation(_) | ModelError::Contract(_) | ModelError::InvalidRow { .. } => {
            StatusCode::BAD_REQUEST
        }
        ModelError::ModelNotLoaded { .. }
        | ModelError::ArtifactNotFound { .. }
        | ModelError::ArtifactCorrupt { .. }
        | ModelError::ArtifactIo { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ModelError::DataNotFound { .. }
        | ModelError::DataFormat { .. }
        | ModelError::Training { .. }
        | ModelError::Evaluation { .. }
        | ModelError::Inference { .. }
        | ModelError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    #[schema(example = "validation_error")]
    pub error: String,
    /// Human-readable description
    pub message: String,
    /// HTTP status code
    pub status: u16,
    /// Offending feature, for contract violations
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "length")]
    pub field: Option<String>,
}

impl From<&ServerError> for ErrorResponse {
    fn from(err: &ServerError) -> Self {
        Self {
            error: err.kind().to_string(),
            message: err.to_string(),
            status: err.status_code().as_u16(),
            field: err.field(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Convenient From implementations for common async error types
impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}
