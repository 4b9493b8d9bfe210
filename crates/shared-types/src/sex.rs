// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Abalone sex codes

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sex of an abalone, the only categorical feature of the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Sex {
    /// Male
    #[serde(rename = "M")]
    Male,
    /// Female
    #[serde(rename = "F")]
    Female,
    /// Infant
    #[serde(rename = "I")]
    Infant,
}

impl Sex {
    /// Admissible codes, in declaration order
    pub const CODES: &'static [&'static str] = &["M", "F", "I"];

    /// Returns the single-letter code used in datasets and requests
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Infant => "I",
        }
    }

    /// Returns all variants
    pub const fn all() -> &'static [Self] {
        &[Self::Male, Self::Female, Self::Infant]
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sex {
    type Err = SexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            "I" => Ok(Self::Infant),
            _ => Err(SexParseError(s.to_string())),
        }
    }
}

/// Error type for sex code parsing
#[derive(Debug, thiserror::Error)]
#[error("unknown sex code '{0}', expected one of M, F, I")]
pub struct SexParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_variants() {
        let codes: Vec<_> = Sex::all().iter().map(|s| s.code()).collect();
        assert_eq!(codes, Sex::CODES);
    }

    #[test]
    fn parse_codes() {
        assert_eq!("M".parse::<Sex>().ok(), Some(Sex::Male));
        assert_eq!("F".parse::<Sex>().ok(), Some(Sex::Female));
        assert_eq!("I".parse::<Sex>().ok(), Some(Sex::Infant));
        assert!("X".parse::<Sex>().is_err());
        assert!("m".parse::<Sex>().is_err());
    }

    #[test]
    fn serde_uses_codes() {
        let serialized = serde_json::to_string(&Sex::Infant).expect("serializes");
        assert_eq!(serialized, "\"I\"");

        let deserialized: Sex = serde_json::from_str("\"F\"").expect("deserializes");
        assert_eq!(deserialized, Sex::Female);
    }
}
