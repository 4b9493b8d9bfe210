// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` documentation module
//!
//! This module provides `OpenAPI` specification and `Swagger UI` endpoints for API documentation.

use axum::{Json, http::StatusCode, response::Html};
use shared_types::{AbaloneFeatures, ContractDescription, PredictionResponse, Sex};
use utoipa::OpenApi;

use crate::{
    config::Environment,
    error::ErrorResponse,
    routes::handlers::{self, ModelInfoResponse},
    state::{HealthCheck, ModelState},
};

/// `OpenAPI` document for the prediction service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Abalone Age API",
        description = "Predicts the ring count and age of an abalone from its physical measurements."
    ),
    paths(
        handlers::root_handler,
        handlers::health_handler,
        handlers::predict_handler,
        handlers::model_info_handler,
        handlers::model_reload_handler,
    ),
    components(schemas(
        AbaloneFeatures,
        ContractDescription,
        Environment,
        ErrorResponse,
        HealthCheck,
        ModelInfoResponse,
        ModelState,
        PredictionResponse,
        Sex,
    )),
    tags(
        (name = "health", description = "Liveness probes"),
        (name = "prediction", description = "Age prediction"),
        (name = "model", description = "Model introspection and reload"),
    )
)]
pub struct ApiDoc;

/// `OpenAPI` specification endpoint
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Swagger UI endpoint
pub async fn swagger_ui() -> Result<Html<&'static str>, StatusCode> {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Abalone Age API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css" />
    <style>
        html { box-sizing: border-box; overflow: -moz-scrollbars-vertical; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin:0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({
                url: '/api-doc/openapi.json',
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                plugins: [
                    SwaggerUIBundle.plugins.DownloadUrl
                ],
                layout: "StandaloneLayout"
            });
        }
    </script>
</body>
</html>
"#;
    Ok(Html(html))
}
