// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the prediction, health and model endpoints

mod fixtures;

use std::net::SocketAddr;

use api::{ErrorResponse, HealthCheck, ModelInfoResponse, ModelState};
use axum::http::StatusCode;
use serde_json::{Value, json};
use shared_types::PredictionResponse;
use tempfile::TempDir;

const TOLERANCE: f64 = 1e-9;

async fn predict(client: &reqwest::Client, addr: SocketAddr, body: &Value) -> reqwest::Response {
    client
        .post(format!("http://{addr}/v1/predict"))
        .json(body)
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
async fn health_is_served_without_a_model() {
    let dir = TempDir::new().expect("tempdir");
    let (addr, token) = fixtures::start_server(&dir.path().join("missing.json")).await;
    let client = reqwest::Client::new();

    for path in ["/", "/health"] {
        let response = client
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let health: HealthCheck = response.json().await.expect("health body");
        assert_eq!(&*health.status, "healthy");
        assert_eq!(health.model_state, ModelState::Uninitialized);
    }

    token.cancel();
}

#[tokio::test]
async fn predict_returns_rings_and_derived_age() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    let pipeline = fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    for index in [0, 4, 6] {
        let response = predict(&client, addr, &fixtures::request(index)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let prediction: PredictionResponse = response.json().await.expect("prediction body");
        let expected = pipeline
            .predict(&fixtures::vector(index))
            .expect("local prediction");

        assert!((prediction.predicted_rings - expected).abs() < TOLERANCE);
        assert!(
            (prediction.predicted_age - (prediction.predicted_rings + 1.5)).abs() < TOLERANCE
        );
    }

    token.cancel();
}

#[tokio::test]
async fn out_of_range_measurement_names_the_field() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    let mut body = fixtures::request(0);
    body["length"] = json!(1.5);
    let response = predict(&client, addr, &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.expect("error body");
    assert_eq!(error.error, "validation_error");
    assert_eq!(error.field.as_deref(), Some("length"));

    token.cancel();
}

#[tokio::test]
async fn unknown_sex_code_names_the_field() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    let mut body = fixtures::request(2);
    body["sex"] = json!("X");
    let response = predict(&client, addr, &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.expect("error body");
    assert_eq!(error.field.as_deref(), Some("sex"));

    token.cancel();
}

#[tokio::test]
async fn missing_and_unknown_fields_are_client_faults() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    let mut missing = fixtures::request(1);
    missing
        .as_object_mut()
        .expect("request is an object")
        .remove("shell_weight");
    let response = predict(&client, addr, &missing).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.expect("error body");
    assert_eq!(error.field.as_deref(), Some("shell_weight"));

    let mut leaking = fixtures::request(1);
    leaking["rings"] = json!(7);
    let response = predict(&client, addr, &leaking).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.expect("error body");
    assert_eq!(error.error, "unknown_feature");
    assert_eq!(error.field.as_deref(), Some("rings"));

    token.cancel();
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/v1/predict"))
        .header("content-type", "application/json")
        .body(r#"{"sex": "M", "length": 0.4"#)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.expect("error body");
    assert_eq!(error.error, "invalid_json");

    token.cancel();
}

#[tokio::test]
async fn missing_artifact_makes_predictions_unavailable() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    let response = predict(&client, addr, &fixtures::request(0)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let error: ErrorResponse = response.json().await.expect("error body");
    assert_eq!(error.error, "model_unavailable");

    // a failed load is not retried implicitly
    fixtures::write_artifact(&artifact, 0.0).await;
    let response = predict(&client, addr, &fixtures::request(0)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let info: ModelInfoResponse = client
        .get(format!("http://{addr}/v1/model/info"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("info body");
    assert_eq!(info.state, ModelState::FailedToLoad);
    assert!(info.error.is_some());

    let response = client
        .post(format!("http://{addr}/v1/model/reload"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = predict(&client, addr, &fixtures::request(0)).await;
    assert_eq!(response.status(), StatusCode::OK);

    token.cancel();
}

#[tokio::test]
async fn model_info_describes_the_contract() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    let info: ModelInfoResponse = client
        .get(format!("http://{addr}/v1/model/info"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("info body");

    assert_eq!(info.model_type, "linear_regression");
    assert_eq!(
        info.features,
        [
            "sex",
            "length",
            "diameter",
            "height",
            "whole_weight",
            "shucked_weight",
            "viscera_weight",
            "shell_weight"
        ]
    );
    assert_eq!(info.target, "rings");
    assert_eq!(info.derived, "age");
    assert_eq!(info.artifact_path, artifact.display().to_string());
    // introspection never loads the model
    assert_eq!(info.state, ModelState::Uninitialized);

    token.cancel();
}

#[tokio::test]
async fn reload_swaps_in_the_new_artifact() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    let before: PredictionResponse = predict(&client, addr, &fixtures::request(3))
        .await
        .json()
        .await
        .expect("prediction body");

    fixtures::write_artifact(&artifact, 100.0).await;
    let unchanged: PredictionResponse = predict(&client, addr, &fixtures::request(3))
        .await
        .json()
        .await
        .expect("prediction body");
    assert!((unchanged.predicted_rings - before.predicted_rings).abs() < TOLERANCE);

    let response = client
        .post(format!("http://{addr}/v1/model/reload"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let info: ModelInfoResponse = response.json().await.expect("info body");
    assert_eq!(info.state, ModelState::Loaded);
    assert!(info.trained_at.is_some());

    let after: PredictionResponse = predict(&client, addr, &fixtures::request(3))
        .await
        .json()
        .await
        .expect("prediction body");
    assert!((after.predicted_rings - before.predicted_rings - 100.0).abs() < 1e-6);

    token.cancel();
}

#[tokio::test]
async fn failed_reload_keeps_serving_the_previous_model() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    let before: PredictionResponse = predict(&client, addr, &fixtures::request(5))
        .await
        .json()
        .await
        .expect("prediction body");

    std::fs::write(&artifact, b"{ not an artifact").expect("overwrite artifact");

    let response = client
        .post(format!("http://{addr}/v1/model/reload"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = predict(&client, addr, &fixtures::request(5)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let after: PredictionResponse = response.json().await.expect("prediction body");
    assert!((after.predicted_rings - before.predicted_rings).abs() < TOLERANCE);

    token.cancel();
}

#[tokio::test]
async fn metrics_and_openapi_are_exported() {
    let dir = TempDir::new().expect("tempdir");
    let artifact = dir.path().join("model.json");
    fixtures::write_artifact(&artifact, 0.0).await;
    let (addr, token) = fixtures::start_server(&artifact).await;
    let client = reqwest::Client::new();

    let response = predict(&client, addr, &fixtures::request(0)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let metrics = client
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("metrics body");
    assert!(metrics.contains("age_api_predictions_total"));

    let doc: Value = client
        .get(format!("http://{addr}/api-doc/openapi.json"))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("openapi body");
    assert!(doc["paths"]["/v1/predict"].is_object());
    assert!(doc["paths"]["/v1/model/reload"].is_object());

    token.cancel();
}
