// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types raised by the feature contract
//!
//! [`ValidationError`] is a client fault: a row or request violates a declared
//! kind or bound. [`ContractError`] covers naming problems: an unrecognized
//! feature name, or a contract whose name mapping is not a bijection.

use std::fmt;

use thiserror::Error;

/// A row or request violated the feature contract
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid feature '{feature}': {reason}")]
pub struct ValidationError {
    /// Name of the offending feature, in the naming form that was validated
    pub feature: String,
    /// Why the value was rejected
    pub reason: ValidationReason,
}

impl ValidationError {
    /// Create a validation error for the given feature
    pub fn new(feature: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            feature: feature.into(),
            reason,
        }
    }

    /// Name of the offending feature
    pub fn feature(&self) -> &str {
        &self.feature
    }
}

/// Reason a feature value was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationReason {
    /// The feature is absent (or explicitly null)
    Missing,
    /// The value has the wrong JSON/CSV kind
    WrongKind {
        /// Kind the contract declares
        expected: &'static str,
        /// Kind that was supplied
        found: &'static str,
    },
    /// The numeric value lies outside the declared inclusive bounds
    OutOfRange {
        /// Supplied value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound, infinite for unbounded features
        max: f64,
    },
    /// The numeric value is NaN or infinite
    NotFinite,
    /// The categorical value is not one of the admissible categories
    UnknownCategory {
        /// Supplied value
        value: String,
        /// Admissible categories
        allowed: &'static [&'static str],
    },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "value is missing"),
            Self::WrongKind { expected, found } => {
                write!(f, "expected a {expected}, got a {found}")
            }
            Self::OutOfRange { value, min, max } if max.is_infinite() => {
                write!(f, "value {value} must be >= {min}")
            }
            Self::OutOfRange { value, min, max } => {
                write!(f, "value {value} is outside [{min}, {max}]")
            }
            Self::NotFinite => write!(f, "value must be a finite number"),
            Self::UnknownCategory { value, allowed } => {
                write!(f, "'{value}' is not one of {}", allowed.join(", "))
            }
        }
    }
}

/// Naming errors of the feature contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// A row carries a feature name the contract does not declare
    #[error("unrecognized feature '{name}'")]
    UnknownFeature {
        /// The unrecognized name
        name: String,
    },

    /// Two features share the same external name
    #[error("external name '{name}' is declared more than once")]
    DuplicateExternalName {
        /// The duplicated name
        name: String,
    },

    /// Two features share the same internal name
    #[error("internal name '{name}' is declared more than once")]
    DuplicateInternalName {
        /// The duplicated name
        name: String,
    },

    /// A name is used as external for one feature and internal for another
    #[error("name '{name}' is used by two different features")]
    AmbiguousName {
        /// The ambiguous name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_feature() {
        let error = ValidationError::new(
            "length",
            ValidationReason::OutOfRange {
                value: 1.5,
                min: 0.0,
                max: 1.0,
            },
        );
        assert_eq!(error.feature(), "length");
        assert_eq!(
            error.to_string(),
            "invalid feature 'length': value 1.5 is outside [0, 1]"
        );
    }

    #[test]
    fn unbounded_range_display() {
        let reason = ValidationReason::OutOfRange {
            value: -0.5,
            min: 0.0,
            max: f64::INFINITY,
        };
        assert_eq!(reason.to_string(), "value -0.5 must be >= 0");
    }

    #[test]
    fn unknown_category_display() {
        let reason = ValidationReason::UnknownCategory {
            value: "X".to_string(),
            allowed: &["M", "F", "I"],
        };
        assert_eq!(reason.to_string(), "'X' is not one of M, F, I");
    }
}
