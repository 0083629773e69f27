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

#![allow(clippy::missing_panics_doc)]

use super::sigen;
use super::sigen::Signal;

#[macro_export]
macro_rules! assert_close {
    ($actual:expr, $expected:expr, rtol = $rtol:expr, atol = $atol:expr) => {{
        let actual: f64 = $actual;
        let expected: f64 = $expected;
        let err = (actual - expected).abs();
        #[allow(clippy::suboptimal_flops)]
        let tol = $rtol * expected.abs() + $atol;
        assert!(
            err < tol,
            "{} is not close to {} (err={}, tol={})",
            actual,
            expected,
            err,
            tol
        );
    }};
    ($actual:expr, $expected:expr) => {{
        assert_close!($actual, $expected, rtol = 0.00001, atol = 0.00001);
    }};
}

#[macro_export]
macro_rules! assert_finite {
    ($result:expr) => {{
        for (i, &value) in $result.iter().enumerate() {
            assert!(
                value.is_normal() || value == 0.0,
                "{}-th element in a vector is not finite ({}), x={:?}.",
                i,
                value,
                $result
            );
        }
    }};
}

/// Uniform white noise with unit amplitude (variance 1/3).
pub fn white_noise(len: usize, seed: u64) -> Vec<f64> {
    sigen::Noise::with_seed(seed, 1.0).to_vec(len)
}

/// Noise-free period-4 sequence `0, 1, 0, -1, 0, 1, ...`.
pub fn alternating(len: usize) -> Vec<f64> {
    const CYCLE: [f64; 4] = [0.0, 1.0, 0.0, -1.0];
    (0..len).map(|t| CYCLE[t % 4]).collect()
}

/// Uniform noise of `amplitude` with a period-4 sequence added from `onset`.
pub fn alternating_after_onset(len: usize, onset: usize, amplitude: f64, seed: u64) -> Vec<f64> {
    let mut ret = sigen::Noise::with_seed(seed, amplitude).to_vec(len);
    for (p, x) in ret.iter_mut().zip(alternating(len)).skip(onset) {
        *p += x;
    }
    ret
}

/// Uniform noise with unit sinusoids of the given periods added from `onset`.
pub fn sinusoids_after_onset(
    len: usize,
    onset: usize,
    periods: &[f64],
    noise_amplitude: f64,
    seed: u64,
) -> Vec<f64> {
    let mut ret = sigen::Noise::with_seed(seed, noise_amplitude).to_vec(len);
    for (k, &period) in periods.iter().enumerate() {
        let phase = 0.7 * k as f64;
        let tone = sigen::Sine::with_initial_phase(period, 1.0, phase).to_vec(len);
        for (p, x) in ret.iter_mut().zip(tone).skip(onset) {
            *p += x;
        }
    }
    ret
}
