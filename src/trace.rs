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

//! Single-channel sample sequences handed over by the preprocessing stage.

use super::config::NoiseWindow;
use super::covariance::remove_mean;
use super::error::ensure_range;
use super::error::RangeError;

/// A cleaned single-channel time series sampled at a fixed interval.
///
/// Loading, channel selection, and bandpass filtering happen before a
/// `Trace` is constructed; this struct only owns the resulting samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Trace {
    samples: Vec<f64>,
    dt: f64,
}

impl Trace {
    /// Constructs `Trace` from samples and the sample interval in seconds.
    ///
    /// # Errors
    ///
    /// Returns `RangeError` if `dt` is not a positive finite number.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pefilter::trace::Trace;
    /// let trace = Trace::from_samples(vec![0.0, 1.0, 0.0, -1.0], 0.01).unwrap();
    /// assert_eq!(trace.len(), 4);
    /// assert!((trace.duration_as_secs() - 0.04).abs() < 1e-12);
    /// ```
    pub fn from_samples(samples: Vec<f64>, dt: f64) -> Result<Self, RangeError> {
        ensure_range!(dt.is_finite() && dt > 0.0, "dt", "must be positive", dt);
        Ok(Self { samples, dt })
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the trace has no sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sample interval in seconds.
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the length of the trace in seconds.
    pub fn duration_as_secs(&self) -> f64 {
        self.samples.len() as f64 * self.dt
    }

    /// Returns the time (in seconds) of the sample at `index`.
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.dt
    }

    /// Returns samples as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    /// Returns a copy of this trace with the mean of `window` removed.
    ///
    /// The mean is taken over the noise window only, and it is subtracted
    /// from every sample. The original trace is left untouched; callers
    /// should keep using the returned trace for every later computation
    /// that must be consistent with the covariance estimated from it.
    ///
    /// # Errors
    ///
    /// Returns `RangeError` if `window` is empty or exceeds the trace.
    pub fn demeaned(&self, window: &NoiseWindow) -> Result<Self, RangeError> {
        Ok(Self {
            samples: remove_mean(&self.samples, window)?,
            dt: self.dt,
        })
    }
}

impl AsRef<[f64]> for Trace {
    fn as_ref(&self) -> &[f64] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn rejects_invalid_dt() {
        assert!(Trace::from_samples(vec![1.0], 0.0).is_err());
        assert!(Trace::from_samples(vec![1.0], f64::NAN).is_err());
        assert!(Trace::from_samples(vec![1.0], -0.5).is_err());
    }

    #[test]
    fn demeaned_trace_keeps_original() {
        let trace = Trace::from_samples(vec![1.0, 3.0, 5.0, 7.0], 0.5).unwrap();
        let demeaned = trace.demeaned(&NoiseWindow::new(0, 2)).unwrap();
        assert_eq!(trace.as_slice(), &[1.0, 3.0, 5.0, 7.0]);
        assert_eq!(demeaned.as_slice(), &[-1.0, 1.0, 3.0, 5.0]);
        assert_close!(demeaned.dt(), 0.5);
        assert_close!(demeaned.time_at(3), 1.5);
    }
}
