// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request body extraction for feature rows
//!
//! [`FeatureRowJson`] replaces axum's `Json` for prediction requests so that a
//! malformed body yields a `400 invalid_json` with a hint instead of axum's
//! plain-text rejection. Contract checks (missing, unknown or out-of-range
//! features) happen later in the inference service.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::Value;
use shared_types::FeatureRow;

use crate::error::ServerError;

const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

const SCALAR_HINT: &str = "feature values must be numbers, or a string for the sex code";

/// A prediction request body parsed into a [`FeatureRow`]
#[derive(Debug)]
pub struct FeatureRowJson(pub FeatureRow);

impl<S> FromRequest<S> for FeatureRowJson
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(content_type) = req.headers().get("content-type")
            && let Ok(content_type) = content_type.to_str()
            && !content_type.starts_with("application/json")
        {
            return Err(json_error(format!(
                "invalid content-type: expected 'application/json', got '{content_type}'"
            )));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| json_error(format!("failed to read request body: {rejection}")))?;

        parse_feature_row(&bytes).map(Self)
    }
}

fn json_error(message: impl Into<String>) -> ServerError {
    ServerError::JsonError {
        message: message.into(),
    }
}

/// Decode `bytes` as a flat JSON object of scalar feature values
fn parse_feature_row(bytes: &[u8]) -> Result<FeatureRow, ServerError> {
    if bytes.len() > MAX_PAYLOAD_SIZE {
        return Err(json_error(format!(
            "request body too large: {} bytes (max: {MAX_PAYLOAD_SIZE} bytes)",
            bytes.len()
        )));
    }
    if bytes.is_empty() {
        return Err(json_error("request body is empty, expected a JSON object of features"));
    }

    serde_json::from_slice(bytes).map_err(|err| {
        if err.is_syntax() {
            json_error(format!(
                "invalid JSON syntax at line {}, column {}: {}",
                err.line(),
                err.column(),
                syntax_hint(&err)
            ))
        } else if err.is_eof() {
            json_error("unexpected end of JSON input, request appears to be truncated")
        } else {
            json_error(shape_hint(bytes))
        }
    })
}

fn syntax_hint(err: &serde_json::Error) -> &'static str {
    let message = err.to_string();

    if message.contains("expected `,`") || message.contains("trailing comma") {
        "check for missing or extra commas between features"
    } else if message.contains("expected '\"'") || message.contains("key must be a string") {
        "feature names must be double-quoted strings"
    } else {
        "check JSON formatting and structure"
    }
}

/// Explains a well-formed body that is not a flat object of scalars
fn shape_hint(bytes: &[u8]) -> String {
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(bytes) else {
        return "request body must be a JSON object mapping feature names to values".to_string();
    };

    let nested: Vec<_> = fields
        .iter()
        .filter(|(_, value)| value.is_object() || value.is_array())
        .map(|(name, _)| format!("\"{name}\""))
        .collect();

    if nested.is_empty() {
        format!("invalid feature value - {SCALAR_HINT}")
    } else {
        format!(
            "invalid feature value - the following fields are not scalars: [{}]. {SCALAR_HINT}",
            nested.join(", ")
        )
    }
}
