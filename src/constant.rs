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

//! Configuration constants

// Top-level constants first, and then sub-modules. Constants that are used
// only in a specific sub-module or its caller should be placed in the
// corresponding submodule.

/// Maximum filter order accepted by the configuration verifier.
pub const MAX_FILTER_ORDER: usize = 512;

/// Smallest ratio between the smallest and the largest absolute LU pivot
/// for a matrix to be treated as invertible.
pub const MIN_PIVOT_RATIO: f64 = 1e-12;

/// Sub-module containing constants related to build-time information.
pub mod build_info {
    pub const CRATE_VERSION: &str = match option_env!("CARGO_PKG_VERSION") {
        Some(v) => v,
        None => "unknown",
    };
}

/// Constants related to covariance estimation.
pub mod covariance {
    /// Tolerance for treating an estimated covariance matrix as symmetric.
    ///
    /// The value is relative to `corr[0]`, i.e. to the noise variance.
    pub const SYMMETRY_RTOL: f64 = 1e-9;
}

/// Default values for the estimator configuration.
pub mod defaults {
    /// Default filter order.
    pub const FILTER_ORDER: usize = 8;

    /// Default start index of the noise window.
    pub const NOISE_WINDOW_START: usize = 0;

    /// Default (exclusive) end index of the noise window.
    pub const NOISE_WINDOW_END: usize = 1000;

    /// Default start index of the training window.
    pub const TRAINING_WINDOW_START: usize = 1000;

    /// Default length of the training window.
    pub const TRAINING_WINDOW_LEN: usize = 200;
}

/// Module for internal error messages.
///
/// Use `panic!` and those messages only for unrecoverable errors that
/// indicate a bug in this crate.
pub(crate) mod panic_msg {
    pub const DATA_INCONSISTENT: &str = "INTERNAL ERROR: Internal variable inconsistency detected.";
}
