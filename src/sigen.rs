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

//! Test signal generator module.
//!
//! This module is primarily intended to be used for tests. However, unlike
//! a module in `test_helper.rs`, this module is exposed to the outside of
//! the crate (with `__export_sigen` feature) for downstream test suites.

use rand::Rng;
use rand::SeedableRng;

/// Test signal generators.
pub trait Signal: std::fmt::Debug {
    /// Generates a signal from t=`sample_offset` and fills the buffer `dest`.
    fn fill_buffer(&self, sample_offset: usize, dest: &mut [f64]);

    /// Generates `len` samples from t=0 and returns them as `Vec`.
    fn to_vec(&self, len: usize) -> Vec<f64> {
        let mut ret = vec![0.0f64; len];
        self.fill_buffer(0, &mut ret);
        ret
    }

    /// Mixes noise with the given seed.
    fn noise_with_seed(self, seed0: u64, amplitude: f64) -> Mix<Self, Noise>
    where
        Self: Sized,
    {
        self.mix(Noise::with_seed(seed0, amplitude))
    }

    /// Mixes signal from the other generator
    fn mix<T: Signal + Sized>(self, other: T) -> Mix<Self, T>
    where
        Self: Sized,
    {
        Mix::new(1.0, self, 1.0, other)
    }

    /// Concats `other` signal after `offset_time` samples are generated.
    fn concat<T: Signal + Sized>(self, offset_time: usize, other: T) -> Switch<Self, T>
    where
        Self: Sized,
    {
        Switch::new(self, offset_time, other)
    }
}

/// Generator for constant signals.
#[derive(Clone, Debug)]
pub struct Dc {
    offset: f64,
}

impl Dc {
    /// Constructs new `Dc` signal.
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }
}

impl Signal for Dc {
    fn fill_buffer(&self, _offset: usize, dest: &mut [f64]) {
        for p in dest {
            *p = self.offset;
        }
    }
}

/// Generator for a sinusoidal wave.
#[derive(Clone, Debug)]
pub struct Sine {
    period: f64,
    amplitude: f64,
    initial_phase: f64,
}

impl Sine {
    /// Constructs new sine wave signal with `period` (in samples) and `amplitude`.
    pub fn new(period: f64, amplitude: f64) -> Self {
        Self::with_initial_phase(period, amplitude, 0.0)
    }

    /// Constructs new sine wave signal that starts at `initial_phase` (radians).
    pub fn with_initial_phase(period: f64, amplitude: f64, initial_phase: f64) -> Self {
        Self {
            period,
            amplitude,
            initial_phase,
        }
    }
}

impl Signal for Sine {
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        for (t, p) in dest.iter_mut().enumerate() {
            let t = (t + offset) as f64;
            *p = self.amplitude
                * f64::sin(self.initial_phase + 2.0 * std::f64::consts::PI * t / self.period);
        }
    }
}

/// Generator for a uniform random white noise.
#[derive(Clone, Debug)]
pub struct Noise {
    seed0: u64,
    amplitude: f64,
}

impl Noise {
    /// Constructs new noise generator with specifying a seed.
    ///
    /// Samples are uniform in `(-amplitude, amplitude)`, i.e. the variance is
    /// `amplitude^2 / 3`.
    pub fn with_seed(seed0: u64, amplitude: f64) -> Self {
        Self { seed0, amplitude }
    }
}

impl Signal for Noise {
    /// Fills buffer with the uniform random values.
    ///
    /// # Note
    ///
    /// This method doesn't ensure reproducibility if it is called in an
    /// arbitraly order, e.g.
    /// `noise.fill_buffer(0, &mut dest[..])` generate different results from
    /// `noise.fill_buffer(0, &mut dest[0..10])` and
    /// `noise.fill_buffer(10, &mut dest[10..])`.
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed0.wrapping_add(offset as u64));
        for p in dest {
            *p = self.amplitude * 2.0 * (rng.sample::<f64, _>(rand::distributions::Open01) - 0.5);
        }
    }
}

/// Decorator that mixes outputs from the inner generators.
#[derive(Clone, Debug)]
pub struct Mix<T1: Signal + Sized, T2: Signal + Sized> {
    weight1: f64,
    weight2: f64,
    signal1: T1,
    signal2: T2,
}

impl<T1: Signal + Sized, T2: Signal + Sized> Mix<T1, T2> {
    /// Constructs new two-inputs mixer.
    pub fn new(weight1: f64, signal1: T1, weight2: f64, signal2: T2) -> Self {
        Self {
            weight1,
            weight2,
            signal1,
            signal2,
        }
    }
}

impl<T1: Signal + Sized, T2: Signal + Sized> Signal for Mix<T1, T2> {
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        let mut buf = vec![0.0f64; dest.len()];
        self.signal1.fill_buffer(offset, &mut buf);
        for (p, x) in dest.iter_mut().zip(buf.iter()) {
            *p = self.weight1 * *x;
        }
        self.signal2.fill_buffer(offset, &mut buf);
        for (p, x) in dest.iter_mut().zip(buf.iter()) {
            *p += self.weight2 * *x;
        }
    }
}

/// Decorator that switches multiple generatros depending on the timestamp.
#[derive(Clone, Debug)]
pub struct Switch<T1: Signal + Sized, T2: Signal + Sized> {
    input1: T1,
    offset: usize,
    input2: T2,
}

impl<T1: Signal + Sized, T2: Signal + Sized> Switch<T1, T2> {
    /// Constructs a switcher.
    pub fn new(input1: T1, offset: usize, input2: T2) -> Self {
        Self {
            input1,
            offset,
            input2,
        }
    }
}

impl<T1: Signal + Sized, T2: Signal + Sized> Signal for Switch<T1, T2> {
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        // use `input1` to fill the entire buffer and then overwrite the later
        // part of the signal.
        self.input1.fill_buffer(offset, dest);
        if self.offset < dest.len() {
            self.input2
                .fill_buffer(offset + self.offset, &mut dest[self.offset..]);
        }
    }
}
