// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the abalone age workspace
//!
//! This crate holds the feature contract and the payload types that both the
//! training pipeline and the prediction service compile against, so the two
//! sides can never disagree on feature names, kinds or bounds.

pub mod contract;
pub mod error;
pub mod payload;
pub mod sex;

pub use contract::{
    AGE_OFFSET, DERIVED_COLUMN, DERIVED_NAME, FeatureContract, FeatureKind, FeatureRow,
    FeatureSpec, FeatureValue, FeatureVector, TARGET_COLUMN, TARGET_NAME,
};
pub use error::{ContractError, ValidationError, ValidationReason};
pub use payload::{AbaloneFeatures, ContractDescription, PredictionResponse};
pub use sex::Sex;
