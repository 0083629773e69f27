// Copyright 2026 pefilter developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generalized normal equations for covariance-weighted prediction.
//!
//! With `D` the `Nd x n` matrix of lagged training segments (column `q`
//! holds the samples `q + 1` steps before each target) and `d` the target
//! segment, the filter `m` minimizing `(d - D m)^T C^-1 (d - D m)` solves
//! `A m = b` with `A = D^T C^-1 D` and `b = D^T C^-1 d`.
//!
//! `X = C^-1 D` is computed once and shared by `A = X^T D` and `b = X^T d`.

use nalgebra::DMatrix;
use nalgebra::DVector;

use super::config::TrainingWindow;
use super::error::ensure_range;
use super::error::PefError;
use super::error::SizeError;

/// The linear system `A m = b` for the filter coefficients `m`.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalEquations {
    a: DMatrix<f64>,
    b: DVector<f64>,
}

impl NormalEquations {
    /// Constructs `NormalEquations` from a system matrix and RHS vector.
    ///
    /// # Errors
    ///
    /// Returns `SizeError` if `a` is not square or its size differs from
    /// `b.len()`.
    pub fn new(a: DMatrix<f64>, b: DVector<f64>) -> Result<Self, SizeError> {
        if a.nrows() != a.ncols() {
            return Err(SizeError::new("a.ncols", &a.nrows(), &a.ncols()));
        }
        if a.nrows() != b.len() {
            return Err(SizeError::new("b", &a.nrows(), &b.len()));
        }
        Ok(Self { a, b })
    }

    /// Returns the filter order `n`.
    pub fn order(&self) -> usize {
        self.b.len()
    }

    /// Returns the system matrix `A`.
    pub const fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    /// Returns the right-hand-side vector `b`.
    pub const fn b(&self) -> &DVector<f64> {
        &self.b
    }

    /// Consumes `self` and returns `(A, b)`.
    pub fn into_parts(self) -> (DMatrix<f64>, DVector<f64>) {
        (self.a, self.b)
    }
}

/// Builds the `Nd x n` matrix whose column `q` is `signal[i0-q-1..i0-q-1+Nd]`.
fn lagged_segments(signal: &[f64], training: &TrainingWindow, order: usize) -> DMatrix<f64> {
    let i0 = training.start;
    DMatrix::from_fn(training.len, order, |t, q| signal[i0 + t - q - 1])
}

/// Assembles the normal equations over `training` for a filter of `order`.
///
/// # Errors
///
/// Returns `PefError::Range` if `order` is zero, `training.start < order`,
/// the training window is empty or runs past the end of `signal`, and
/// `PefError::Size` if `inverse_covariance` is not `Nd x Nd`.
pub fn build_normal_equations(
    signal: &[f64],
    training: &TrainingWindow,
    order: usize,
    inverse_covariance: &DMatrix<f64>,
) -> Result<NormalEquations, PefError> {
    ensure_range!(order >= 1, "order", "must be positive", order);
    ensure_range!(
        training.len >= 1,
        "training_window",
        "must not be empty",
        training
    );
    ensure_range!(
        training.start >= order,
        "training_window",
        "must start after `order` samples of history",
        training
    );
    ensure_range!(
        training.end() <= signal.len(),
        "training_window",
        "must lie within the signal",
        training
    );
    let nd = training.len;
    if inverse_covariance.shape() != (nd, nd) {
        return Err(SizeError::new(
            "inverse_covariance",
            &format!("{nd}x{nd}"),
            &format!(
                "{}x{}",
                inverse_covariance.nrows(),
                inverse_covariance.ncols()
            ),
        )
        .into());
    }

    let lagged = lagged_segments(signal, training, order);
    let target = DVector::from_column_slice(&signal[training.start..training.end()]);
    let x = inverse_covariance * &lagged;
    let b = x.tr_mul(&target);
    let a = x.tr_mul(&lagged);
    Ok(NormalEquations { a, b })
}
