// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Abalone Age API Server Implementation
//!
//! This crate provides the HTTP server that serves predictions from the fitted
//! abalone age pipeline, built with Axum and designed for production use with
//! layered configuration, middleware, and graceful shutdown capabilities.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`state`]: Shared application state holding the inference service
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`extractors`]: JSON extraction with field-level error hints
//! - [`metrics`]: Prometheus counters and histograms for predictions and reloads
//! - [`openapi`]: `OpenAPI` specification and Swagger UI endpoints for API documentation
//!
//! # Endpoints
//!
//! - `GET /`, `GET /health`: liveness, never touches the model
//! - `POST /v1/predict`: ring count and age for one abalone
//! - `GET /v1/model/info`: feature contract, artifact path and model state
//! - `POST /v1/model/reload`: atomically swap in the artifact on disk
//! - `GET /metrics`, `GET /api-doc/openapi.json`, `GET /swagger-ui`

pub mod config;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ErrorResponse, ServerError, ServerResult};
pub use routes::handlers::ModelInfoResponse;
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ModelState, ServerState};
