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

//! Fit-once, evaluate-many orchestration of the estimation steps.
//!
//! [`fit`] runs covariance estimation, normal equations assembly and the
//! solve on a training window. The returned [`FittedFilter`] can then be
//! evaluated on arbitrary horizons of the same trace, or on other traces,
//! with the noise covariance re-estimated at the evaluation horizon.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::config;
use super::config::NoiseWindow;
use super::config::TrainingWindow;
#[cfg(feature = "log")]
use super::constant::build_info::CRATE_VERSION;
use super::constant::panic_msg;
use super::covariance::estimate_covariance;
use super::covariance::NoiseCovariance;
use super::error::PefError;
use super::error::Verify;
use super::normal::build_normal_equations;
use super::predict::Filter;
use super::score;
use super::solver::solve;
use super::trace::Trace;

/// Prediction of a window together with its ground truth and score.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    start: usize,
    predicted: Vec<f64>,
    observed: Vec<f64>,
    rms: f64,
}

impl Evaluation {
    fn new(
        signal: &[f64],
        filter: &Filter,
        start: usize,
        horizon: usize,
        cov: &NoiseCovariance,
    ) -> Result<Self, PefError> {
        let predicted = filter.predict(signal, start, horizon)?;
        let observed = signal[start..start + horizon].to_vec();
        let rms = score::score(&predicted, &observed, cov.inverse())?;
        Ok(Self {
            start,
            predicted,
            observed,
            rms,
        })
    }

    /// Returns the index of the first predicted sample.
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Returns the number of predicted samples.
    pub fn horizon(&self) -> usize {
        self.predicted.len()
    }

    /// Returns the predicted samples.
    pub fn predicted(&self) -> &[f64] {
        &self.predicted
    }

    /// Returns the (demeaned) observed samples.
    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// Returns the covariance-weighted RMS error.
    pub const fn rms(&self) -> f64 {
        self.rms
    }

    /// Returns the unweighted RMS error.
    pub fn plain_rms(&self) -> f64 {
        score::plain_rms(&self.predicted, &self.observed)
            .expect(panic_msg::DATA_INCONSISTENT)
    }

    /// Returns `predicted - observed`.
    pub fn residual(&self) -> Vec<f64> {
        self.predicted
            .iter()
            .zip(&self.observed)
            .map(|(p, o)| p - o)
            .collect()
    }
}

/// Filter coefficients fitted on a trace, with the context to evaluate them.
#[derive(Clone, Debug)]
pub struct FittedFilter {
    filter: Filter,
    noise_window: NoiseWindow,
    training_window: TrainingWindow,
    /// The training trace after mean removal.
    trace: Trace,
    training: Evaluation,
    covariances: RefCell<BTreeMap<usize, Rc<NoiseCovariance>>>,
}

impl FittedFilter {
    /// Returns the fitted filter.
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Consumes `self` and returns the fitted filter.
    pub fn into_filter(self) -> Filter {
        self.filter
    }

    /// Returns the noise window used for covariance estimation.
    pub const fn noise_window(&self) -> &NoiseWindow {
        &self.noise_window
    }

    /// Returns the training window.
    pub const fn training_window(&self) -> &TrainingWindow {
        &self.training_window
    }

    /// Returns the demeaned training trace.
    pub const fn demeaned_trace(&self) -> &Trace {
        &self.trace
    }

    /// Returns the in-sample evaluation over the training window.
    pub const fn training_evaluation(&self) -> &Evaluation {
        &self.training
    }

    /// Returns the noise covariance of the training trace for `horizon`.
    ///
    /// The estimate for the training horizon is kept for the lifetime of
    /// `self`; for other horizons only the most recently requested one is
    /// kept, so sweeping over horizons does not accumulate matrices.
    ///
    /// # Errors
    ///
    /// Same as [`estimate_covariance`].
    pub fn covariance(&self, horizon: usize) -> Result<Rc<NoiseCovariance>, PefError> {
        if let Some(cov) = self.covariances.borrow().get(&horizon) {
            return Ok(Rc::clone(cov));
        }
        let cov = Rc::new(estimate_covariance(
            self.trace.as_slice(),
            &self.noise_window,
            horizon,
        )?);
        let training_len = self.training_window.len;
        let mut cache = self.covariances.borrow_mut();
        cache.retain(|h, _| *h == training_len);
        cache.insert(horizon, Rc::clone(&cov));
        Ok(cov)
    }

    /// Returns the horizons whose covariance estimates are currently cached.
    pub fn cached_horizons(&self) -> Vec<usize> {
        self.covariances.borrow().keys().copied().collect()
    }

    /// Predicts and scores `[start, start + horizon)` of the training trace.
    ///
    /// `horizon` may differ from the training length; the covariance is
    /// re-estimated from the same noise window at that size.
    ///
    /// # Errors
    ///
    /// Returns `PefError::Range` if the window does not fit in the trace or
    /// lacks history, and `PefError::Numerical` if the covariance for
    /// `horizon` cannot be inverted.
    pub fn evaluate(&self, start: usize, horizon: usize) -> Result<Evaluation, PefError> {
        let cov = self.covariance(horizon)?;
        let evaluation =
            Evaluation::new(self.trace.as_slice(), &self.filter, start, horizon, &cov)?;
        #[cfg(feature = "log")]
        log::debug!(
            target: "pefilter::pipeline::jsonl",
            "{{ event: \"evaluate\", start: {}, horizon: {}, rms: {}, plain_rms: {} }}",
            start,
            horizon,
            evaluation.rms(),
            evaluation.plain_rms(),
        );
        Ok(evaluation)
    }

    /// Applies the fitted filter to another trace.
    ///
    /// The mean of `trace` over the same noise window is removed, and the
    /// noise covariance is estimated from that window of `trace`.
    ///
    /// # Errors
    ///
    /// Same as [`FittedFilter::evaluate`].
    pub fn evaluate_on(
        &self,
        trace: &Trace,
        start: usize,
        horizon: usize,
    ) -> Result<Evaluation, PefError> {
        let demeaned = trace.demeaned(&self.noise_window)?;
        let cov = estimate_covariance(demeaned.as_slice(), &self.noise_window, horizon)?;
        let evaluation =
            Evaluation::new(demeaned.as_slice(), &self.filter, start, horizon, &cov)?;
        #[cfg(feature = "log")]
        log::debug!(
            target: "pefilter::pipeline::jsonl",
            "{{ event: \"evaluate_on\", samples: {}, start: {}, horizon: {}, rms: {} }}",
            trace.len(),
            start,
            horizon,
            evaluation.rms(),
        );
        Ok(evaluation)
    }
}

/// Fits a prediction-error filter on `trace` following `config`.
///
/// # Errors
///
/// Returns `PefError::Config` if `config` does not verify, and propagates
/// range, size and numerical errors from each estimation step.
///
/// # Examples
///
/// ```
/// # use pefilter::config;
/// # use pefilter::trace::Trace;
/// # use rand::Rng;
/// # use rand::SeedableRng;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// // Background noise, then a tone arriving at t = 400.
/// let samples: Vec<f64> = (0..600)
///     .map(|t| {
///         let tone = if t >= 400 { (t as f64 * 0.3).sin() } else { 0.0 };
///         tone + rng.gen_range(-0.1..0.1)
///     })
///     .collect();
/// let trace = Trace::from_samples(samples, 0.01).unwrap();
/// let config = config::Estimator {
///     filter_order: 4,
///     noise_window: config::NoiseWindow::new(0, 350),
///     training_window: config::TrainingWindow::new(420, 20),
///     ..config::Estimator::default()
/// };
/// let fitted = pefilter::fit(&config, &trace).unwrap();
/// assert_eq!(fitted.filter().order(), 4);
/// ```
pub fn fit(config: &config::Estimator, trace: &Trace) -> Result<FittedFilter, PefError> {
    config.verify()?;
    let noise_window = config.noise_window;
    let training_window = config.training_window;

    let demeaned = trace.demeaned(&noise_window)?;
    let cov = estimate_covariance(demeaned.as_slice(), &noise_window, training_window.len)?;
    let eqs = build_normal_equations(
        demeaned.as_slice(),
        &training_window,
        config.filter_order,
        cov.inverse(),
    )?;
    let filter = solve(&eqs, config.solve_method)?;
    let training = Evaluation::new(
        demeaned.as_slice(),
        &filter,
        training_window.start,
        training_window.len,
        &cov,
    )?;

    #[cfg(feature = "log")]
    log::debug!(
        target: "pefilter::pipeline::jsonl",
        concat!(
            "{{ event: \"fit\", version: \"{}\", order: {}, noise_window: \"{}\", ",
            "training_window: \"{}\", corr0: {}, asymmetry: {}, rms: {} }}"
        ),
        CRATE_VERSION,
        config.filter_order,
        noise_window,
        training_window,
        cov.correlation()[0],
        cov.asymmetry(),
        training.rms(),
    );

    let mut covariances = BTreeMap::new();
    covariances.insert(training_window.len, Rc::new(cov));
    Ok(FittedFilter {
        filter,
        noise_window,
        training_window,
        trace: demeaned,
        training,
        covariances: RefCell::new(covariances),
    })
}
