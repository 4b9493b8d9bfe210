// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Feature contract
//!
//! The contract is the single definition of every model input: its
//! request-facing (external) name, its dataset-facing (internal) name, its
//! kind and its bounds. Training validates dataset rows against it using the
//! internal names; serving validates requests against it using the external
//! names and then translates them, so both sides always produce the same
//! feature vector layout.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ContractError, ValidationError, ValidationReason},
    payload::ContractDescription,
    sex::Sex,
};

/// Fixed offset between ring count and age in years
pub const AGE_OFFSET: f64 = 1.5;

/// Dataset column holding the training target
pub const TARGET_COLUMN: &str = "Rings";

/// Request-facing name of the training target
pub const TARGET_NAME: &str = "rings";

/// Dataset column computed from the target for reporting; never a feature
pub const DERIVED_COLUMN: &str = "Age";

/// Request-facing name of the derived reporting quantity
pub const DERIVED_NAME: &str = "age";

/// A single cell of a dataset row or request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Numeric value
    Number(f64),
    /// Textual value
    Text(String),
    /// Boolean value, never valid for any feature
    Flag(bool),
    /// Explicit null
    Null,
}

impl FeatureValue {
    /// Parse a raw CSV cell: empty cells are null, numeric text is a number
    pub fn parse_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    /// Name of the value's kind, used in error messages
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Flag(_) => "boolean",
            Self::Null => "null",
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A row keyed by feature name; the naming form depends on where it came from
pub type FeatureRow = BTreeMap<String, FeatureValue>;

/// Kind and bounds of a feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    /// One of a closed set of string categories
    Categorical {
        /// Admissible categories
        categories: &'static [&'static str],
    },
    /// Number within inclusive bounds
    Bounded {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// Number greater than or equal to zero
    NonNegative,
}

impl FeatureKind {
    /// Whether this feature is categorical
    pub const fn is_categorical(&self) -> bool {
        matches!(self, Self::Categorical { .. })
    }
}

/// Declaration of a single feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSpec {
    /// Request-facing name
    pub external: &'static str,
    /// Dataset-facing name the pipeline is trained with
    pub internal: &'static str,
    /// Kind and bounds
    pub kind: FeatureKind,
}

impl FeatureSpec {
    /// Declare a feature
    pub const fn new(external: &'static str, internal: &'static str, kind: FeatureKind) -> Self {
        Self {
            external,
            internal,
            kind,
        }
    }

    fn check(&self, name: &str, value: Option<&FeatureValue>) -> Result<(), ValidationError> {
        let reject = |reason: ValidationReason| -> Result<(), ValidationError> {
            Err(ValidationError::new(name, reason))
        };

        let value = match value {
            None | Some(FeatureValue::Null) => return reject(ValidationReason::Missing),
            Some(value) => value,
        };

        match (self.kind, value) {
            (FeatureKind::Categorical { categories }, FeatureValue::Text(text)) => {
                if categories.contains(&text.as_str()) {
                    Ok(())
                } else {
                    reject(ValidationReason::UnknownCategory {
                        value: text.clone(),
                        allowed: categories,
                    })
                }
            }
            (FeatureKind::Categorical { .. }, other) => reject(ValidationReason::WrongKind {
                expected: "string",
                found: other.kind_name(),
            }),
            (FeatureKind::Bounded { .. } | FeatureKind::NonNegative, FeatureValue::Number(n))
                if !n.is_finite() =>
            {
                reject(ValidationReason::NotFinite)
            }
            (FeatureKind::Bounded { min, max }, FeatureValue::Number(n)) => {
                if (min..=max).contains(n) {
                    Ok(())
                } else {
                    reject(ValidationReason::OutOfRange { value: *n, min, max })
                }
            }
            (FeatureKind::NonNegative, FeatureValue::Number(n)) => {
                if *n >= 0.0 {
                    Ok(())
                } else {
                    reject(ValidationReason::OutOfRange {
                        value: *n,
                        min: 0.0,
                        max: f64::INFINITY,
                    })
                }
            }
            (FeatureKind::Bounded { .. } | FeatureKind::NonNegative, other) => {
                reject(ValidationReason::WrongKind {
                    expected: "number",
                    found: other.kind_name(),
                })
            }
        }
    }
}

const UNIT_INTERVAL: FeatureKind = FeatureKind::Bounded { min: 0.0, max: 1.0 };

const ABALONE_FEATURES: [FeatureSpec; 8] = [
    FeatureSpec::new(
        "sex",
        "Sex",
        FeatureKind::Categorical {
            categories: Sex::CODES,
        },
    ),
    FeatureSpec::new("length", "Length", UNIT_INTERVAL),
    FeatureSpec::new("diameter", "Diameter", UNIT_INTERVAL),
    FeatureSpec::new("height", "Height", UNIT_INTERVAL),
    FeatureSpec::new("whole_weight", "Whole weight", FeatureKind::NonNegative),
    FeatureSpec::new("shucked_weight", "Shucked weight", FeatureKind::NonNegative),
    FeatureSpec::new("viscera_weight", "Viscera weight", FeatureKind::NonNegative),
    FeatureSpec::new("shell_weight", "Shell weight", FeatureKind::NonNegative),
];

/// Feature values laid out in contract order, categorical and numerical apart
///
/// This is the closed shape the transform stage consumes: position `i` of
/// `categorical` is the `i`-th categorical feature of the contract, and
/// likewise for `numerical`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Categorical values in contract order
    pub categorical: Vec<String>,
    /// Numerical values in contract order
    pub numerical: Vec<f64>,
}

/// Canonical schema of the model inputs
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureContract {
    features: Vec<FeatureSpec>,
}

impl FeatureContract {
    /// Build a contract, checking that the external/internal mapping is a bijection
    ///
    /// # Errors
    ///
    /// Returns a `ContractError` if a name is declared twice in the same form,
    /// or if a name is external for one feature and internal for another.
    pub fn new(features: Vec<FeatureSpec>) -> Result<Self, ContractError> {
        let mut externals = HashSet::new();
        let mut internals = HashSet::new();

        for spec in &features {
            if !externals.insert(spec.external) {
                return Err(ContractError::DuplicateExternalName {
                    name: spec.external.to_string(),
                });
            }
            if !internals.insert(spec.internal) {
                return Err(ContractError::DuplicateInternalName {
                    name: spec.internal.to_string(),
                });
            }
        }

        for spec in &features {
            let crosses = features.iter().any(|other| {
                other.external != spec.external && other.internal == spec.external
            });
            if crosses {
                return Err(ContractError::AmbiguousName {
                    name: spec.external.to_string(),
                });
            }
        }

        Ok(Self { features })
    }

    /// The abalone contract: sex code plus seven physical measurements
    pub fn abalone() -> Self {
        Self {
            features: ABALONE_FEATURES.to_vec(),
        }
    }

    /// All declared features, in contract order
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    /// External names, in contract order
    pub fn external_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.external).collect()
    }

    /// Internal names, in contract order
    pub fn internal_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.internal).collect()
    }

    /// Categorical features, in contract order
    pub fn categorical(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features.iter().filter(|f| f.kind.is_categorical())
    }

    /// Numerical features, in contract order
    pub fn numerical(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features.iter().filter(|f| !f.kind.is_categorical())
    }

    /// Validate a request keyed by external names
    ///
    /// Features are checked in contract order and the first violation is
    /// reported. Keys the contract does not declare are left to
    /// [`Self::to_internal`].
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first offending feature.
    pub fn validate(&self, row: &FeatureRow) -> Result<(), ValidationError> {
        self.features
            .iter()
            .try_for_each(|spec| spec.check(spec.external, row.get(spec.external)))
    }

    /// Validate a dataset row keyed by internal names
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first offending feature.
    pub fn validate_internal(&self, row: &FeatureRow) -> Result<(), ValidationError> {
        self.features
            .iter()
            .try_for_each(|spec| spec.check(spec.internal, row.get(spec.internal)))
    }

    /// Rename every key of a request from external to internal form
    ///
    /// # Errors
    ///
    /// Returns `ContractError::UnknownFeature` for the first unrecognized key.
    pub fn to_internal(&self, row: &FeatureRow) -> Result<FeatureRow, ContractError> {
        row.iter()
            .map(|(name, value)| {
                self.features
                    .iter()
                    .find(|spec| spec.external == name)
                    .map(|spec| (spec.internal.to_string(), value.clone()))
                    .ok_or_else(|| ContractError::UnknownFeature { name: name.clone() })
            })
            .collect()
    }

    /// Lay out a row keyed by internal names as a [`FeatureVector`]
    ///
    /// The row is validated first, so the returned vector always satisfies
    /// every declared kind and bound.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first offending feature.
    pub fn vectorize(&self, row: &FeatureRow) -> Result<FeatureVector, ValidationError> {
        self.validate_internal(row)?;

        let mut categorical = Vec::new();
        let mut numerical = Vec::new();
        for spec in &self.features {
            match row.get(spec.internal) {
                Some(FeatureValue::Text(text)) => categorical.push(text.clone()),
                Some(FeatureValue::Number(number)) => numerical.push(*number),
                _ => return Err(ValidationError::new(spec.internal, ValidationReason::Missing)),
            }
        }

        Ok(FeatureVector {
            categorical,
            numerical,
        })
    }

    /// External feature names and the target/derived quantity names
    pub fn describe(&self) -> ContractDescription {
        ContractDescription {
            features: self
                .external_names()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            target: TARGET_NAME.to_string(),
            derived: DERIVED_NAME.to_string(),
        }
    }
}

impl Default for FeatureContract {
    fn default() -> Self {
        Self::abalone()
    }
}
