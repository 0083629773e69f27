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

//! Estimator configuration structs.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::constant::defaults;
use super::constant::MAX_FILTER_ORDER;
use super::error::verify_range;
use super::error::verify_true;
use super::error::Verify;
use super::error::VerifyError;

/// Configuration for the prediction-error filter estimator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Estimator {
    /// Number of preceding samples used for predicting a sample.
    pub filter_order: usize,
    /// Window assumed to contain only noise.
    pub noise_window: NoiseWindow,
    /// Window used for fitting the filter coefficients.
    pub training_window: TrainingWindow,
    /// Method used for solving the normal equations.
    pub solve_method: SolveMethod,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            filter_order: defaults::FILTER_ORDER,
            noise_window: NoiseWindow::default(),
            training_window: TrainingWindow::default(),
            solve_method: SolveMethod::default(),
        }
    }
}

impl Verify for Estimator {
    fn verify(&self) -> Result<(), VerifyError> {
        verify_range!("filter_order", self.filter_order, 1..=MAX_FILTER_ORDER)?;
        self.noise_window
            .verify()
            .map_err(|e| e.within("noise_window"))?;
        self.training_window
            .verify()
            .map_err(|e| e.within("training_window"))?;
        let filter_order = self.filter_order;
        verify_true!(
            "training_window.start",
            self.training_window.start >= filter_order,
            "must be greater than or equal to filter_order ({filter_order})"
        )
    }
}

/// Half-open index range `[start, end)` of a noise-only segment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NoiseWindow {
    /// First index of the window (`imin`).
    pub start: usize,
    /// Index next to the last index of the window (`imax`).
    pub end: usize,
}

impl NoiseWindow {
    /// Constructs a noise window `[start, end)`.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the number of samples in the window.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the window contains no sample.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NoiseWindow {
    fn default() -> Self {
        Self {
            start: defaults::NOISE_WINDOW_START,
            end: defaults::NOISE_WINDOW_END,
        }
    }
}

impl fmt::Display for NoiseWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl Verify for NoiseWindow {
    fn verify(&self) -> Result<(), VerifyError> {
        let start = self.start;
        verify_true!("end", self.end > start, "must be greater than start ({start})")
    }
}

/// Index range `[start, start + len)` used for fitting coefficients.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrainingWindow {
    /// First predicted index (`i0`).
    pub start: usize,
    /// Number of predicted samples (`Nd`).
    pub len: usize,
}

impl TrainingWindow {
    /// Constructs a training window starting at `start` with `len` samples.
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Returns the index next to the last sample of the window.
    ///
    /// Saturates at `usize::MAX`, which no signal can contain.
    pub const fn end(&self) -> usize {
        self.start.saturating_add(self.len)
    }
}

impl Default for TrainingWindow {
    fn default() -> Self {
        Self {
            start: defaults::TRAINING_WINDOW_START,
            len: defaults::TRAINING_WINDOW_LEN,
        }
    }
}

impl fmt::Display for TrainingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl Verify for TrainingWindow {
    fn verify(&self) -> Result<(), VerifyError> {
        verify_range!("len", self.len, 1..)?;
        verify_true!(
            "len",
            self.start.checked_add(self.len).is_some(),
            "must not overflow the index range when added to start"
        )
    }
}

/// Method for solving the normal equations `A m = b`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum SolveMethod {
    /// Direct solve with an LU decomposition.
    #[default]
    Lu,
    /// Explicit inversion followed by `A^-1 b`.
    Inverse,
}
