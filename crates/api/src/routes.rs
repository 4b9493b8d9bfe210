// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the prediction server.

pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{
    health_handler, model_info_handler, model_reload_handler, predict_handler, root_handler,
};

use crate::{
    metrics::metrics_handler,
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    let health_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let api_routes = Router::new()
        .route("/predict", post(predict_handler))
        .route("/model/info", get(model_info_handler))
        .route("/model/reload", post(model_reload_handler));

    let v1 = Router::new().nest("/v1", api_routes);

    Router::new()
        .merge(health_routes)
        .merge(docs_routes)
        .merge(v1)
}
