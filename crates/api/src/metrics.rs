// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::Response,
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};

use crate::error::{ServerError, ServerResult};

/// Total number of prediction requests, labeled by result.
pub static PREDICTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "age_api_predictions_total",
        "Total number of prediction requests, labeled by result",
        &["result"]
    )
    .expect("Failed to create age_api_predictions_total counter vec")
});

/// Histogram for prediction durations in seconds.
pub static PREDICTION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "age_api_prediction_duration_seconds",
        "Prediction request durations in seconds",
        &["result"],
        vec![0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5]
    )
    .expect("Failed to create prediction duration histogram")
});

/// Total number of model reloads, labeled by result.
pub static MODEL_RELOADS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "age_api_model_reloads_total",
        "Total number of model reload requests, labeled by result",
        &["result"]
    )
    .expect("Failed to create age_api_model_reloads_total counter vec")
});

/// Record a finished prediction
///
/// # Arguments
/// * `result` - `ok`, or the error kind of the failed request
/// * `duration_secs` - The duration of the request in seconds
pub fn observe_prediction(result: &str, duration_secs: f64) {
    PREDICTIONS.with_label_values(&[result]).inc();
    PREDICTION_DURATION
        .with_label_values(&[result])
        .observe(duration_secs);
}

/// Record a reload attempt
pub fn record_reload(result: &str) {
    MODEL_RELOADS.with_label_values(&[result]).inc();
}

/// Axum handler that exports metrics in Prometheus text format
///
/// # Errors
///
/// Returns `ServerError::Metrics` if the registry cannot be encoded.
pub async fn metrics_handler() -> ServerResult<Response<String>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ServerError::Metrics {
            message: e.to_string(),
        })?;
    let body = String::from_utf8(buffer).map_err(|e| ServerError::Metrics {
        message: e.to_string(),
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoder.format_type())
        .body(body)
        .map_err(|e| ServerError::Metrics {
            message: e.to_string(),
        })
}
