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

//! Empirical noise covariance estimation.
//!
//! The covariance model is built from the one-sided auto-correlation of a
//! noise-only window. Row `i` of the covariance matrix is the correlation
//! vector rotated right by `i`, so `C[i][k] = corr[(k - i) mod horizon]`.
//! The matrix is not symmetrized; [`NoiseCovariance::is_symmetric`] can be
//! used to check how far it is from a symmetric Toeplitz matrix.

use nalgebra::DMatrix;
use nalgebra::DVector;

use super::config::NoiseWindow;
use super::constant::MIN_PIVOT_RATIO;
use super::error::ensure_range;
use super::error::NumericalError;
use super::error::NumericalErrorReason;
use super::error::PefError;
use super::error::RangeError;

/// Checks that `window` is non-empty and lies within `[0, limit]`.
fn check_noise_window(window: &NoiseWindow, limit: usize) -> Result<(), RangeError> {
    ensure_range!(
        window.start < window.end,
        "noise_window",
        "must not be empty",
        window
    );
    ensure_range!(
        window.end <= limit,
        "noise_window",
        "must leave room for the largest lag within the signal",
        window
    );
    Ok(())
}

/// Returns a copy of `signal` with the mean of `signal[window]` removed.
///
/// # Errors
///
/// Returns `RangeError` if `window` is empty or exceeds `signal`.
///
/// # Examples
///
/// ```
/// # use pefilter::config::NoiseWindow;
/// # use pefilter::covariance::remove_mean;
/// let demeaned = remove_mean(&[2.0, 4.0, 9.0], &NoiseWindow::new(0, 2)).unwrap();
/// assert_eq!(demeaned, vec![-1.0, 1.0, 6.0]);
/// ```
pub fn remove_mean(signal: &[f64], window: &NoiseWindow) -> Result<Vec<f64>, RangeError> {
    check_noise_window(window, signal.len())?;
    let segment = &signal[window.start..window.end];
    let mean = segment.iter().sum::<f64>() / segment.len() as f64;
    Ok(signal.iter().map(|x| x - mean).collect())
}

/// Computes lag-products averaged over the noise window.
///
/// `dest[j]` is the mean of `signal[i] * signal[i + j]` for `i` in the
/// window. `dest.len()` determines the number of lags.
///
/// # Panics
///
/// Panics if `signal` is shorter than `window.end + dest.len() - 1`.
pub fn auto_correlation(signal: &[f64], window: &NoiseWindow, dest: &mut [f64]) {
    let segment = &signal[window.start..window.end];
    let denom = segment.len() as f64;
    for (lag, p) in dest.iter_mut().enumerate() {
        let shifted = &signal[window.start + lag..window.end + lag];
        *p = segment
            .iter()
            .zip(shifted)
            .map(|(x, y)| x * y)
            .sum::<f64>()
            / denom;
    }
}

/// Builds the circulant matrix whose `i`-th row is `corr` rotated by `i`.
pub fn circulant(corr: &DVector<f64>) -> DMatrix<f64> {
    let size = corr.len();
    DMatrix::from_fn(size, size, |i, k| corr[(k + size - i) % size])
}

/// Returns the ratio between the smallest and the largest absolute pivot.
///
/// Returns zero for an all-zero diagonal.
fn pivot_ratio(u_diag: &DVector<f64>) -> f64 {
    let (min, max) = u_diag
        .iter()
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), x| {
            (lo.min(x.abs()), hi.max(x.abs()))
        });
    if max > 0.0 {
        min / max
    } else {
        0.0
    }
}

/// Inverts a square matrix, rejecting singular and near-singular inputs.
///
/// # Errors
///
/// Returns `NumericalError` if an LU pivot vanishes or the ratio of the
/// smallest and largest pivots is below [`MIN_PIVOT_RATIO`].
pub fn checked_inverse(
    matrix: &DMatrix<f64>,
    target: &str,
) -> Result<DMatrix<f64>, NumericalError> {
    let lu = matrix.clone().lu();
    let ratio = pivot_ratio(&lu.u().diagonal());
    if !(ratio >= MIN_PIVOT_RATIO) {
        let reason = if ratio == 0.0 {
            NumericalErrorReason::NonInvertible
        } else {
            NumericalErrorReason::IllConditioned
        };
        return Err(NumericalError::new(target, reason).with_pivot_ratio(ratio));
    }
    let inverse = lu
        .try_inverse()
        .ok_or_else(|| NumericalError::new(target, NumericalErrorReason::NonInvertible))?;
    if inverse.iter().all(|x| x.is_finite()) {
        Ok(inverse)
    } else {
        Err(NumericalError::new(target, NumericalErrorReason::NotFinite))
    }
}

/// Pivot ratio of the LU decomposition, exposed for the solver module.
pub(crate) fn lu_pivot_ratio(lu: &nalgebra::LU<f64, nalgebra::Dyn, nalgebra::Dyn>) -> f64 {
    pivot_ratio(&lu.u().diagonal())
}

/// Noise statistics for a given horizon.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseCovariance {
    corr: DVector<f64>,
    matrix: DMatrix<f64>,
    inverse: DMatrix<f64>,
}

impl NoiseCovariance {
    /// Returns the number of lags (rows and columns of the matrix).
    pub fn horizon(&self) -> usize {
        self.corr.len()
    }

    /// Returns the correlation vector (lag 0 first).
    pub const fn correlation(&self) -> &DVector<f64> {
        &self.corr
    }

    /// Returns the covariance matrix.
    pub const fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Returns the inverse of the covariance matrix.
    pub const fn inverse(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    /// Returns the largest absolute difference between `C` and `C^T`.
    pub fn asymmetry(&self) -> f64 {
        let size = self.horizon();
        let mut ret = 0.0f64;
        for i in 0..size {
            for k in (i + 1)..size {
                ret = ret.max((self.matrix[(i, k)] - self.matrix[(k, i)]).abs());
            }
        }
        ret
    }

    /// Checks if `C` is symmetric within `rtol` relative to `corr[0]`.
    pub fn is_symmetric(&self, rtol: f64) -> bool {
        self.asymmetry() <= rtol * self.corr[0].abs()
    }

    /// Consumes `self` and returns (correlation, covariance, inverse).
    pub fn into_parts(self) -> (DVector<f64>, DMatrix<f64>, DMatrix<f64>) {
        (self.corr, self.matrix, self.inverse)
    }
}

/// Estimates the noise covariance of `signal` over `window` for `horizon` lags.
///
/// The samples are used as given, i.e. the caller is responsible for
/// removing the mean beforehand (see [`estimate_covariance_demeaned`]).
///
/// # Errors
///
/// Returns `PefError::Range` if `horizon` is zero or the window is empty or
/// does not leave `horizon` samples after it, and `PefError::Numerical`
/// if the covariance matrix cannot be inverted.
pub fn estimate_covariance(
    signal: &[f64],
    window: &NoiseWindow,
    horizon: usize,
) -> Result<NoiseCovariance, PefError> {
    ensure_range!(horizon >= 1, "horizon", "must be positive", horizon);
    check_noise_window(window, signal.len().saturating_sub(horizon))?;

    let mut corr = vec![0.0f64; horizon];
    auto_correlation(signal, window, &mut corr);
    let corr = DVector::from_vec(corr);
    let matrix = circulant(&corr);
    let inverse = checked_inverse(&matrix, "covariance")?;
    Ok(NoiseCovariance {
        corr,
        matrix,
        inverse,
    })
}

/// Removes the noise-window mean and estimates the noise covariance.
///
/// Returns the demeaned copy of `signal` together with the estimate. The
/// copy should be passed to the later prediction and scoring steps, and to
/// further [`estimate_covariance`] calls with different horizons, so that
/// the mean is removed exactly once.
///
/// # Errors
///
/// Same as [`estimate_covariance`].
pub fn estimate_covariance_demeaned(
    signal: &[f64],
    window: &NoiseWindow,
    horizon: usize,
) -> Result<(Vec<f64>, NoiseCovariance), PefError> {
    let demeaned = remove_mean(signal, window)?;
    let cov = estimate_covariance(&demeaned, window, horizon)?;
    Ok((demeaned, cov))
}

#[cfg(test)]
#[allow(clippy::pedantic, clippy::nursery, clippy::needless_range_loop)]
mod tests {
    use super::*;
    use crate::assert_close;
    use crate::constant::covariance::SYMMETRY_RTOL;
    use crate::test_helper;

    use rstest::rstest;

    #[test]
    fn auto_correlation_computation() {
        let signal = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut corr = [0.0; 2];
        auto_correlation(&signal, &NoiseWindow::new(0, 3), &mut corr);
        assert_close!(corr[0], (1.0 + 4.0 + 9.0) / 3.0);
        assert_close!(corr[1], (2.0 + 6.0 + 12.0) / 3.0);
    }

    #[test]
    fn circulant_rows_are_rotations() {
        let corr = DVector::from_vec(vec![4.0, 3.0, 2.0, 1.0]);
        let c = circulant(&corr);
        let row = |i: usize| c.row(i).iter().copied().collect::<Vec<_>>();
        assert_eq!(row(0), vec![4.0, 3.0, 2.0, 1.0]);
        assert_eq!(row(1), vec![1.0, 4.0, 3.0, 2.0]);
        assert_eq!(row(3), vec![3.0, 2.0, 1.0, 4.0]);
    }

    #[test]
    fn mean_is_removed_over_noise_window_only() {
        let signal = [1.0, 1.0, 1.0, 10.0];
        let demeaned = remove_mean(&signal, &NoiseWindow::new(0, 3)).unwrap();
        assert_eq!(demeaned, vec![0.0, 0.0, 0.0, 9.0]);
    }

    #[test]
    fn empty_noise_window_is_range_error() {
        let signal = test_helper::white_noise(128, 1);
        let err = estimate_covariance(&signal, &NoiseWindow::new(40, 40), 8).unwrap_err();
        assert!(matches!(err, PefError::Range(_)));
        let err = remove_mean(&signal, &NoiseWindow::new(40, 40)).unwrap_err();
        assert_eq!(err.var(), "noise_window");
    }

    #[test]
    fn noise_window_must_leave_room_for_lags() {
        let signal = test_helper::white_noise(100, 1);
        // `end` may not exceed `len - horizon`.
        assert!(estimate_covariance(&signal, &NoiseWindow::new(0, 92), 8).is_ok());
        let err = estimate_covariance(&signal, &NoiseWindow::new(0, 93), 8).unwrap_err();
        assert!(matches!(err, PefError::Range(_)));
    }

    #[test]
    fn zero_horizon_is_range_error() {
        let signal = test_helper::white_noise(100, 1);
        let err = estimate_covariance(&signal, &NoiseWindow::new(0, 50), 0).unwrap_err();
        assert!(matches!(err, PefError::Range(_)));
    }

    #[rstest]
    fn dimensions_follow_horizon(#[values(1, 7, 32, 100)] horizon: usize) {
        let signal = test_helper::white_noise(2000, 3);
        let cov = estimate_covariance(&signal, &NoiseWindow::new(0, 1500), horizon).unwrap();
        assert_eq!(cov.horizon(), horizon);
        assert_eq!(cov.correlation().len(), horizon);
        assert_eq!(cov.matrix().shape(), (horizon, horizon));
        assert_eq!(cov.inverse().shape(), (horizon, horizon));
        assert!(cov.correlation()[0] >= 0.0);
    }

    #[test]
    fn estimation_is_deterministic() {
        let signal = test_helper::white_noise(1000, 5);
        let window = NoiseWindow::new(100, 900);
        let (d1, c1) = estimate_covariance_demeaned(&signal, &window, 16).unwrap();
        let (d2, c2) = estimate_covariance_demeaned(&signal, &window, 16).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(c1.correlation(), c2.correlation());
        assert_eq!(c1.matrix(), c2.matrix());
        assert_eq!(c1.inverse(), c2.inverse());
    }

    #[test]
    fn inverse_is_inverse() {
        let signal = test_helper::white_noise(3000, 7);
        let cov = estimate_covariance(&signal, &NoiseWindow::new(0, 2900), 24).unwrap();
        let product = cov.matrix() * cov.inverse();
        for i in 0..24 {
            for k in 0..24 {
                let expected = if i == k { 1.0 } else { 0.0 };
                assert_close!(product[(i, k)], expected, rtol = 1e-9, atol = 1e-9);
            }
        }
    }

    #[test]
    fn zero_signal_is_not_invertible() {
        let signal = vec![0.0; 64];
        let err = estimate_covariance(&signal, &NoiseWindow::new(0, 40), 8).unwrap_err();
        match err {
            PefError::Numerical(e) => {
                assert_eq!(e.target(), "covariance");
                assert_eq!(e.reason(), NumericalErrorReason::NonInvertible);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn noise_free_periodic_signal_is_rank_deficient() {
        let signal = test_helper::alternating(64);
        let result = estimate_covariance(&signal, &NoiseWindow::new(0, 40), 8);
        assert!(matches!(result, Err(PefError::Numerical(_))));
    }

    #[test]
    fn symmetry_of_periodic_plus_noise_covariance() {
        // Lags `j` and `horizon - j` are estimated independently, so the
        // circulant matrix is only symmetric when they happen to agree.
        let signal = test_helper::alternating_after_onset(512, 0, 0.01, 11);
        let cov = estimate_covariance(&signal, &NoiseWindow::new(0, 400), 8).unwrap();
        let c = cov.matrix();
        assert_close!(c[(0, 2)], c[(2, 0)], rtol = 0.05, atol = 0.01);
        assert_close!(c[(0, 4)], c[(4, 0)], rtol = 1e-12, atol = 1e-12);
        assert!(cov.asymmetry() < 0.01);
    }

    #[test]
    fn white_noise_covariance_is_nearly_symmetric_but_not_exactly() {
        let signal = test_helper::white_noise(4000, 13);
        let cov = estimate_covariance(&signal, &NoiseWindow::new(0, 3900), 16).unwrap();
        assert!(!cov.is_symmetric(SYMMETRY_RTOL));
        assert!(cov.is_symmetric(0.2));
    }

    #[test]
    fn exactly_symmetric_correlation_gives_symmetric_matrix() {
        let corr = DVector::from_vec(vec![2.0, 0.5, 0.1, 0.5]);
        let c = circulant(&corr);
        assert_eq!(c, c.transpose());
        let inv = checked_inverse(&c, "covariance").unwrap();
        assert_close!((&c * &inv)[(1, 1)], 1.0);
    }
}
