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

//! Causal FIR prediction with fixed coefficients.

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::error::ensure_range;
use super::error::RangeError;

/// Prediction filter coefficients `m_0 .. m_{n-1}`.
///
/// `m_i` is applied to the sample `i + 1` steps before the predicted one.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Filter {
    coefs: Vec<f64>,
}

impl Filter {
    /// Constructs `Filter` from coefficients.
    pub fn new(coefs: Vec<f64>) -> Self {
        Self { coefs }
    }

    /// Returns the filter order (number of coefficients).
    pub fn order(&self) -> usize {
        self.coefs.len()
    }

    /// Returns the coefficients.
    pub fn coefs(&self) -> &[f64] {
        &self.coefs
    }

    /// Predicts `horizon` samples starting at `start` (see [`predict`]).
    ///
    /// # Errors
    ///
    /// Same as [`predict`].
    pub fn predict(
        &self,
        signal: &[f64],
        start: usize,
        horizon: usize,
    ) -> Result<Vec<f64>, RangeError> {
        predict(signal, start, horizon, &self.coefs)
    }

    /// Computes the prediction error `signal[t] - predicted[t]`.
    ///
    /// This is the output of the prediction-error filter `(1, -m_0, ..,
    /// -m_{n-1})` over `[start, start + horizon)`.
    ///
    /// # Errors
    ///
    /// Same as [`predict`].
    pub fn prediction_error(
        &self,
        signal: &[f64],
        start: usize,
        horizon: usize,
    ) -> Result<Vec<f64>, RangeError> {
        let predicted = self.predict(signal, start, horizon)?;
        Ok(signal[start..start + horizon]
            .iter()
            .zip(predicted)
            .map(|(x, p)| x - p)
            .collect())
    }
}

/// Predicts `signal[start .. start + horizon]` from preceding samples.
///
/// `predicted[j] = sum_i signal[start + j - i - 1] * coefs[i]`. Only real
/// samples are read; predictions are never fed back, so `horizon` may
/// exceed the training length as long as the samples exist.
///
/// # Errors
///
/// Returns `RangeError` if `start < coefs.len()` or if `start + horizon`
/// exceeds `signal.len()`.
///
/// # Examples
///
/// ```
/// # use pefilter::predict::predict;
/// let signal = [1.0, 2.0, 4.0, 8.0, 16.0];
/// let predicted = predict(&signal, 1, 4, &[2.0]).unwrap();
/// assert_eq!(predicted, vec![2.0, 4.0, 8.0, 16.0]);
/// ```
pub fn predict(
    signal: &[f64],
    start: usize,
    horizon: usize,
    coefs: &[f64],
) -> Result<Vec<f64>, RangeError> {
    let order = coefs.len();
    ensure_range!(
        start >= order,
        "start",
        "must be greater than or equal to the filter order",
        start
    );
    ensure_range!(
        start.checked_add(horizon).is_some_and(|end| end <= signal.len()),
        "horizon",
        "must not run past the end of the signal",
        horizon
    );
    Ok((start..start + horizon)
        .map(|t| {
            signal[t - order..t]
                .iter()
                .rev()
                .zip(coefs)
                .map(|(x, m)| x * m)
                .sum::<f64>()
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::pedantic, clippy::nursery, clippy::needless_range_loop)]
mod tests {
    use super::*;
    use crate::assert_close;
    use crate::test_helper;

    use rstest::rstest;

    #[test]
    fn matches_convolution_definition() {
        let signal = test_helper::white_noise(64, 21);
        let coefs = [0.5, -0.25, 0.125];
        let predicted = predict(&signal, 10, 20, &coefs).unwrap();
        for j in 0..20 {
            let mut expected = 0.0;
            for i in 0..coefs.len() {
                expected += signal[10 + j - i - 1] * coefs[i];
            }
            assert_close!(predicted[j], expected, rtol = 1e-12, atol = 1e-12);
        }
    }

    #[test]
    fn prediction_is_idempotent() {
        let signal = test_helper::white_noise(256, 22);
        let filter = Filter::new(vec![0.3, 0.2, -0.1, 0.05]);
        let p1 = filter.predict(&signal, 40, 100).unwrap();
        let p2 = filter.predict(&signal, 40, 100).unwrap();
        assert_eq!(p1, p2);
    }

    #[rstest]
    fn output_length_is_horizon(#[values(0, 1, 8, 200)] horizon: usize) {
        let signal = test_helper::white_noise(256, 23);
        let filter = Filter::new(vec![1.0; 4]);
        assert_eq!(filter.predict(&signal, 4, horizon).unwrap().len(), horizon);
    }

    #[test]
    fn exact_recursion_is_reproduced() {
        // x[t] = x[t-1] - 0.5 x[t-2]
        let mut signal = vec![1.0, 0.5];
        for t in 2..50 {
            signal.push(signal[t - 1] - 0.5 * signal[t - 2]);
        }
        let filter = Filter::new(vec![1.0, -0.5]);
        let errors = filter.prediction_error(&signal, 2, 48).unwrap();
        for e in errors {
            assert_close!(e, 0.0);
        }
    }

    #[test]
    fn rejects_missing_history() {
        let signal = [0.0; 16];
        let err = predict(&signal, 2, 4, &[1.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(err.var(), "start");
    }

    #[test]
    fn rejects_prediction_past_end() {
        let signal = [0.0; 16];
        let err = predict(&signal, 4, 13, &[1.0]).unwrap_err();
        assert_eq!(err.var(), "horizon");
        assert!(predict(&signal, 4, 12, &[1.0]).is_ok());
    }

    #[test]
    fn rejects_overflowing_horizon() {
        let signal = [1.0; 16];
        let err = predict(&signal, 4, usize::MAX, &[1.0]).unwrap_err();
        assert_eq!(err.var(), "horizon");
        let filter = Filter::new(vec![1.0]);
        assert!(filter.prediction_error(&signal, 4, usize::MAX).is_err());
    }
}
