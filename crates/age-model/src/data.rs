// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Data pipeline
//!
//! Loads the tabular dataset, derives the target, removes leakage columns and
//! performs the seeded train/test split. Every dataset row is validated
//! against the feature contract before it can reach a model.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use shared_types::{
    AGE_OFFSET, DERIVED_COLUMN, FeatureContract, FeatureRow, FeatureValue, FeatureVector,
    TARGET_COLUMN, ValidationError, ValidationReason,
};
use tracing::{debug, info};

use crate::error::{ModelError, ModelResult};

/// A dataset row as read from the source, keyed by column header
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source file
    pub line: u64,
    /// Cells keyed by column header
    pub cells: FeatureRow,
}

/// Features and targets ready for training, row-aligned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledData {
    /// Feature vectors; never contain the target or the derived age
    pub features: Vec<FeatureVector>,
    /// Ring counts
    pub rings: Vec<f64>,
    /// Derived ages, kept for reporting only
    pub ages: Vec<f64>,
}

impl LabeledData {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            rings: indices.iter().map(|&i| self.rings[i]).collect(),
            ages: indices.iter().map(|&i| self.ages[i]).collect(),
        }
    }
}

/// Deterministic train/test partition
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    /// Source row indices of the training partition
    pub train_indices: Vec<usize>,
    /// Source row indices of the test partition
    pub test_indices: Vec<usize>,
    /// Training partition
    pub train: LabeledData,
    /// Held-out partition
    pub test: LabeledData,
}

/// Read every row of the dataset at `path`
///
/// # Errors
///
/// Returns `ModelError::DataNotFound` if the file does not exist, and
/// `ModelError::DataFormat` if a required column (every contract feature plus
/// the target) is missing or a record cannot be read.
pub fn load(path: impl AsRef<Path>, contract: &FeatureContract) -> ModelResult<Vec<RawRow>> {
    let mut required = contract.internal_names();
    required.push(TARGET_COLUMN);
    read_rows(path.as_ref(), &required)
}

/// Read feature rows for batch prediction, ignoring any target column
///
/// # Errors
///
/// Same as [`load`], except that the target column is optional, plus
/// `ModelError::InvalidRow` for rows violating the feature contract.
pub fn load_features(
    path: impl AsRef<Path>,
    contract: &FeatureContract,
) -> ModelResult<Vec<FeatureVector>> {
    let rows = read_rows(path.as_ref(), &contract.internal_names())?;

    rows.into_iter()
        .map(|mut row| {
            row.cells.remove(TARGET_COLUMN);
            row.cells.remove(DERIVED_COLUMN);
            contract
                .vectorize(&row.cells)
                .map_err(|source| ModelError::InvalidRow {
                    line: row.line,
                    source,
                })
        })
        .collect()
}

fn read_rows(path: &Path, required: &[&str]) -> ModelResult<Vec<RawRow>> {
    if !path.exists() {
        return Err(ModelError::DataNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<_> = required
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .collect();
    if !missing.is_empty() {
        return Err(ModelError::data_format(format!(
            "{} is missing required columns: {}",
            path.display(),
            missing
                .iter()
                .map(|column| format!("'{column}'"))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let rows = reader
        .records()
        .map(|record| record.map(|record| to_raw_row(&headers, &record)))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        path = %path.display(),
        rows = rows.len(),
        columns = headers.len(),
        "loaded dataset"
    );

    Ok(rows)
}

fn to_raw_row(headers: &StringRecord, record: &StringRecord) -> RawRow {
    RawRow {
        line: record.position().map_or(0, csv::Position::line),
        cells: headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), FeatureValue::parse_cell(cell)))
            .collect(),
    }
}

fn ring_count(row: &RawRow) -> ModelResult<f64> {
    let invalid = |reason| ModelError::InvalidRow {
        line: row.line,
        source: ValidationError::new(TARGET_COLUMN, reason),
    };

    match row.cells.get(TARGET_COLUMN) {
        Some(FeatureValue::Number(rings)) if rings.is_finite() && rings.fract() == 0.0 => {
            if *rings >= 0.0 {
                Ok(*rings)
            } else {
                Err(invalid(ValidationReason::OutOfRange {
                    value: *rings,
                    min: 0.0,
                    max: f64::INFINITY,
                }))
            }
        }
        Some(FeatureValue::Number(_)) => Err(invalid(ValidationReason::WrongKind {
            expected: "integer",
            found: "fractional number",
        })),
        None | Some(FeatureValue::Null) => Err(invalid(ValidationReason::Missing)),
        Some(other) => Err(invalid(ValidationReason::WrongKind {
            expected: "integer",
            found: other.kind_name(),
        })),
    }
}

/// Derive the age from the ring count, then strip both from the features
///
/// The age is computed before the split for reporting, but it is derived
/// from the target and must never be a feature.
///
/// # Errors
///
/// Returns `ModelError::InvalidRow` for a row whose target is missing or not
/// a non-negative integer, or whose features violate the contract.
pub fn derive_target_and_drop_leakage(
    rows: Vec<RawRow>,
    contract: &FeatureContract,
) -> ModelResult<LabeledData> {
    let mut data = LabeledData {
        features: Vec::with_capacity(rows.len()),
        rings: Vec::with_capacity(rows.len()),
        ages: Vec::with_capacity(rows.len()),
    };

    for mut row in rows {
        let rings = ring_count(&row)?;
        let age = rings + AGE_OFFSET;
        row.cells
            .insert(DERIVED_COLUMN.to_string(), FeatureValue::Number(age));

        row.cells.remove(TARGET_COLUMN);
        row.cells.remove(DERIVED_COLUMN);

        let features = contract
            .vectorize(&row.cells)
            .map_err(|source| ModelError::InvalidRow {
                line: row.line,
                source,
            })?;

        data.features.push(features);
        data.rings.push(rings);
        data.ages.push(age);
    }

    debug!(rows = data.len(), "derived target and dropped leakage columns");
    Ok(data)
}

/// Partition `0..n` into (train, test) index sets
///
/// The permutation comes from a `StdRng` seeded with `seed` alone; the test
/// partition takes the first `ceil(test_fraction * n)` permuted indices.
///
/// # Errors
///
/// Returns `ModelError::DataFormat` if the fraction is not in (0, 1) or if
/// either partition would be empty.
pub fn split_indices(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> ModelResult<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ModelError::data_format(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ModelError::data_format(format!(
            "cannot split {n} rows with test fraction {test_fraction}: a partition would be empty"
        )));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    Ok((train, permutation))
}

/// Split labeled data into train and test partitions
///
/// The same data in the same order with the same seed always yields the same
/// partitions.
///
/// # Errors
///
/// See [`split_indices`].
pub fn split(data: &LabeledData, test_fraction: f64, seed: u64) -> ModelResult<TrainTestSplit> {
    let (train_indices, test_indices) = split_indices(data.len(), test_fraction, seed)?;

    info!(
        train_rows = train_indices.len(),
        test_rows = test_indices.len(),
        test_fraction,
        seed,
        "split dataset"
    );

    Ok(TrainTestSplit {
        train: data.select(&train_indices),
        test: data.select(&test_indices),
        train_indices,
        test_indices,
    })
}
