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

//! Goodness-of-fit scores for predictions.

use nalgebra::DMatrix;
use nalgebra::DVector;

use super::error::NumericalError;
use super::error::NumericalErrorReason;
use super::error::PefError;
use super::error::SizeError;

fn check_lengths(predicted: &[f64], observed: &[f64]) -> Result<(), SizeError> {
    if predicted.len() != observed.len() {
        return Err(SizeError::new(
            "observed",
            &predicted.len(),
            &observed.len(),
        ));
    }
    if predicted.is_empty() {
        return Err(SizeError::new("predicted", &"at least 1", &0));
    }
    Ok(())
}

/// Computes the covariance-weighted RMS of `predicted - observed`.
///
/// `sqrt(r^T C^-1 r / L)` with `r = predicted - observed`. A score close to
/// one means that the residual is as large as, and correlated like, the
/// noise the covariance was estimated from.
///
/// # Errors
///
/// Returns `PefError::Size` if the lengths of `predicted`, `observed` and
/// the dimension of `inverse_covariance` disagree or are zero, and
/// `PefError::Numerical` if the quadratic form is not finite, or negative
/// (possible because the covariance matrix is not symmetrized).
pub fn score(
    predicted: &[f64],
    observed: &[f64],
    inverse_covariance: &DMatrix<f64>,
) -> Result<f64, PefError> {
    check_lengths(predicted, observed)?;
    let len = predicted.len();
    if inverse_covariance.shape() != (len, len) {
        return Err(SizeError::new(
            "inverse_covariance",
            &format!("{len}x{len}"),
            &format!(
                "{}x{}",
                inverse_covariance.nrows(),
                inverse_covariance.ncols()
            ),
        )
        .into());
    }
    let residual = DVector::from_iterator(
        len,
        predicted.iter().zip(observed).map(|(p, o)| p - o),
    );
    let quad = residual.dot(&(inverse_covariance * &residual));
    if !quad.is_finite() {
        return Err(NumericalError::new(
            "residual quadratic form",
            NumericalErrorReason::NotFinite,
        )
        .into());
    }
    if quad < 0.0 {
        return Err(NumericalError::new(
            "residual quadratic form",
            NumericalErrorReason::NegativeQuadraticForm,
        )
        .into());
    }
    Ok((quad / len as f64).sqrt())
}

/// Computes the plain (unweighted) RMS of `predicted - observed`.
///
/// # Errors
///
/// Returns `SizeError` if the lengths disagree or are zero.
///
/// # Examples
///
/// ```
/// # use pefilter::score::plain_rms;
/// let rms = plain_rms(&[1.0, 1.0], &[0.0, 2.0]).unwrap();
/// assert!((rms - 1.0).abs() < 1e-12);
/// ```
pub fn plain_rms(predicted: &[f64], observed: &[f64]) -> Result<f64, SizeError> {
    check_lengths(predicted, observed)?;
    let sum_sq: f64 = predicted
        .iter()
        .zip(observed)
        .map(|(p, o)| (p - o) * (p - o))
        .sum();
    Ok((sum_sq / predicted.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn identity_weight_is_plain_rms() {
        let predicted = [1.0, 2.0, 3.0, 4.0];
        let observed = [0.0, 2.0, 5.0, 4.0];
        let weighted = score(&predicted, &observed, &DMatrix::identity(4, 4)).unwrap();
        let plain = plain_rms(&predicted, &observed).unwrap();
        assert_close!(weighted, plain);
        assert_close!(plain, (5.0f64 / 4.0).sqrt());
    }

    #[test]
    fn weights_scale_the_score() {
        let predicted = [1.0, 1.0];
        let observed = [0.0, 0.0];
        let cinv = DMatrix::from_diagonal_element(2, 2, 4.0);
        assert_close!(score(&predicted, &observed, &cinv).unwrap(), 2.0);
    }

    #[test]
    fn perfect_prediction_scores_zero() {
        let x = [0.5, -0.25, 1.0];
        let cinv = DMatrix::from_diagonal_element(3, 3, 10.0);
        assert_close!(score(&x, &x, &cinv).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_size_errors() {
        let predicted = vec![0.0; 10];
        let observed = vec![0.0; 12];
        let err = score(&predicted, &observed, &DMatrix::identity(10, 10)).unwrap_err();
        match err {
            PefError::Size(e) => assert_eq!(e.var(), "observed"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(plain_rms(&predicted, &observed).is_err());
    }

    #[test]
    fn mismatched_covariance_is_size_error() {
        let x = vec![0.0; 10];
        let err = score(&x, &x, &DMatrix::identity(12, 12)).unwrap_err();
        assert!(matches!(err, PefError::Size(_)));
    }

    #[test]
    fn empty_residual_is_size_error() {
        let err = score(&[], &[], &DMatrix::identity(0, 0)).unwrap_err();
        assert!(matches!(err, PefError::Size(_)));
    }

    #[test]
    fn negative_quadratic_form_is_numerical_error() {
        let cinv = DMatrix::from_diagonal_element(2, 2, -1.0);
        let err = score(&[1.0, 0.0], &[0.0, 0.0], &cinv).unwrap_err();
        match err {
            PefError::Numerical(e) => {
                assert_eq!(e.reason(), NumericalErrorReason::NegativeQuadraticForm);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_finite_quadratic_form_is_numerical_error() {
        let cinv = DMatrix::from_diagonal_element(2, 2, f64::NAN);
        let err = score(&[1.0, 0.0], &[0.0, 0.0], &cinv).unwrap_err();
        match err {
            PefError::Numerical(e) => assert_eq!(e.reason(), NumericalErrorReason::NotFinite),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
