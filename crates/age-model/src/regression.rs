// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Ordinary least squares estimator
//!
//! The intercept is fitted by centering; the coefficients are the
//! minimum-norm least-squares solution obtained from a one-sided Jacobi SVD
//! of the centered design matrix. Columns whose norm falls to
//! `max(eps * max(n, p), 1e-12) * ||A||_F` are numerically zero: they are
//! neither rotated nor used in the solve, so rank-deficient and
//! underdetermined systems still converge to a unique, stable solution.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, ModelResult};

/// Upper bound on Jacobi sweeps before the decomposition is declared divergent
const MAX_SWEEPS: usize = 60;

/// Relative orthogonality at which a column pair needs no further rotation
const ORTHOGONALITY_TOLERANCE: f64 = 1e-13;

/// Smallest relative column norm still counted towards the rank
const RANK_FLOOR: f64 = 1e-12;

/// Fitted linear model `y = x . coefficients + intercept`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    /// One weight per design-matrix column
    pub coefficients: Vec<f64>,
    /// Constant term
    pub intercept: f64,
}

impl LinearRegression {
    /// Fit the model on design matrix `x` (rows are samples) and targets `y`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Training` for an empty or misaligned input, for
    /// non-finite values, or if the SVD does not converge.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> ModelResult<Self> {
        let (n, p) = x.dim();
        if n == 0 {
            return Err(ModelError::training("cannot fit estimator on zero rows"));
        }
        if y.len() != n {
            return Err(ModelError::training(format!(
                "design matrix has {n} rows but target has {}",
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::training("training data contains non-finite values"));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ModelError::training("cannot center an empty design matrix"))?;
        let y_mean = y.sum() / to_f64(n);

        let centered_x = x - &x_mean;
        let centered_y = y - y_mean;

        let coefficients = min_norm_solution(centered_x, &centered_y)?;
        let intercept = y_mean - x_mean.dot(&coefficients);

        Ok(Self {
            coefficients: coefficients.to_vec(),
            intercept,
        })
    }

    /// Predict one value per row of `x`
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Inference` if `x` does not have one column per coefficient.
    pub fn predict(&self, x: &Array2<f64>) -> ModelResult<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(ModelError::inference(format!(
                "design matrix has {} columns, model expects {}",
                x.ncols(),
                self.coefficients.len()
            )));
        }

        let weights = ArrayView1::from(self.coefficients.as_slice());
        Ok(x.dot(&weights) + self.intercept)
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: usize) -> f64 {
    n as f64
}

/// Solve `min ||a w - b||` with minimal `||w||` via one-sided Jacobi SVD
fn min_norm_solution(mut a: Array2<f64>, b: &Array1<f64>) -> ModelResult<Array1<f64>> {
    let (n, p) = a.dim();
    let mut v = Array2::<f64>::eye(p);

    // rotations preserve the Frobenius norm, so the threshold holds throughout
    let frobenius = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let negligible = (f64::EPSILON * to_f64(n.max(p))).max(RANK_FLOOR) * frobenius;

    let sweeps = orthogonalize_columns(&mut a, &mut v, negligible)?;

    let mut solution = Array1::<f64>::zeros(p);
    let mut rank = 0;
    for (j, column) in a.columns().into_iter().enumerate() {
        let s = column.dot(&column).sqrt();
        if s <= negligible || s == 0.0 {
            continue;
        }
        rank += 1;
        // a_j = sigma_j * u_j, so u_j . b / sigma_j = a_j . b / sigma_j^2
        let weight = column.dot(b) / (s * s);
        solution.scaled_add(weight, &v.column(j));
    }

    debug!(rows = n, columns = p, rank, sweeps, "solved least squares");
    Ok(solution)
}

/// Rotate column pairs of `a` until they are mutually orthogonal, accumulating into `v`
///
/// Columns with norm at or below `negligible` hold only rounding noise and are
/// left alone; they can never become relatively orthogonal to anything.
fn orthogonalize_columns(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    negligible: f64,
) -> ModelResult<usize> {
    let p = a.ncols();
    let floor = negligible * negligible;

    for sweep in 1..=MAX_SWEEPS {
        let mut rotated = false;

        for i in 0..p.saturating_sub(1) {
            for j in (i + 1)..p {
                let alpha = a.column(i).dot(&a.column(i));
                let beta = a.column(j).dot(&a.column(j));
                if alpha <= floor || beta <= floor {
                    continue;
                }

                let gamma = a.column(i).dot(&a.column(j));
                if gamma == 0.0 || gamma.abs() <= ORTHOGONALITY_TOLERANCE * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + zeta.hypot(1.0));
                let c = 1.0 / t.hypot(1.0);
                let s = c * t;

                rotate(a, i, j, c, s);
                rotate(v, i, j, c, s);
            }
        }

        if !rotated {
            return Ok(sweep);
        }
    }

    Err(ModelError::training(format!(
        "singular value decomposition did not converge within {MAX_SWEEPS} sweeps"
    )))
}

fn rotate(m: &mut Array2<f64>, i: usize, j: usize, c: f64, s: f64) {
    for mut row in m.rows_mut() {
        let (left, right) = (row[i], row[j]);
        row[i] = c * left - s * right;
        row[j] = s * left + c * right;
    }
}
