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

//! Error and verification traits

use std::error::Error;
use std::fmt;

/// Error emitted when an index or a window is out of the expected range.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct RangeError {
    var: String,
    reason: String,
    actual: String,
}

impl RangeError {
    /// Makes range error from `actual: impl Display` that is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pefilter::error::*;
    /// let err = RangeError::from_display("noise_window", "must not be empty", &"0..0");
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "`noise_window` is out of range: must not be empty (actual=0..0)"
    /// );
    /// ```
    pub fn from_display<T>(var: &str, reason: &str, actual: &T) -> Self
    where
        T: fmt::Display,
    {
        Self {
            var: var.to_owned(),
            reason: reason.to_owned(),
            actual: format!("{actual}"),
        }
    }

    /// Returns the name of the offending variable.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Error for RangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` is out of range: {} (actual={})",
            self.var, self.reason, self.actual
        )
    }
}

/// Checks that `$cond` holds, and returns `Err(RangeError)` otherwise.
macro_rules! ensure_range {
    ($cond:expr, $varname:literal, $reason:literal, $actual:expr) => {
        if !$cond {
            return Err(crate::error::RangeError::from_display(
                $varname,
                $reason,
                &$actual,
            )
            .into());
        }
    };
}
pub(crate) use ensure_range;

/// Error emitted when the sizes of arrays given together do not agree.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct SizeError {
    var: String,
    expected: String,
    actual: String,
}

impl SizeError {
    /// Makes size error for `var` that was expected to be `expected`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pefilter::error::*;
    /// let err = SizeError::new("observed", &10, &12);
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "size mismatch on `observed`: expected 10, got 12"
    /// );
    /// ```
    pub fn new<T, U>(var: &str, expected: &T, actual: &U) -> Self
    where
        T: fmt::Display,
        U: fmt::Display,
    {
        Self {
            var: var.to_owned(),
            expected: format!("{expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Returns the name of the offending variable.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Error for SizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size mismatch on `{}`: expected {}, got {}",
            self.var, self.expected, self.actual
        )
    }
}

/// Enum covering reasons of numerical failures.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum NumericalErrorReason {
    /// The matrix could not be inverted.
    NonInvertible,
    /// The linear system has no unique solution.
    SingularSystem,
    /// The matrix is invertible in principle, but its LU pivots span too
    /// many orders of magnitude.
    IllConditioned,
    /// A result is NaN or infinite.
    NotFinite,
    /// A quadratic form expected to be non-negative came out negative.
    NegativeQuadraticForm,
}

impl fmt::Display for NumericalErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonInvertible => write!(f, "matrix is not invertible"),
            Self::SingularSystem => write!(f, "linear system is singular"),
            Self::IllConditioned => write!(f, "matrix is ill-conditioned"),
            Self::NotFinite => write!(f, "result is not finite"),
            Self::NegativeQuadraticForm => write!(f, "quadratic form is negative"),
        }
    }
}

/// Error emitted when a matrix inversion or a linear solve fails.
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct NumericalError {
    target: String,
    reason: NumericalErrorReason,
    pivot_ratio: Option<f64>,
}

impl NumericalError {
    /// Makes numerical error on `target` (typically a matrix name).
    ///
    /// # Examples
    ///
    /// ```
    /// # use pefilter::error::*;
    /// let err = NumericalError::new("covariance", NumericalErrorReason::NonInvertible);
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "numerical error on `covariance`: matrix is not invertible"
    /// );
    /// ```
    pub fn new(target: &str, reason: NumericalErrorReason) -> Self {
        Self {
            target: target.to_owned(),
            reason,
            pivot_ratio: None,
        }
    }

    /// Attaches the observed pivot ratio for diagnostics.
    #[must_use]
    pub fn with_pivot_ratio(self, ratio: f64) -> Self {
        Self {
            pivot_ratio: Some(ratio),
            ..self
        }
    }

    /// Returns the reason of this error.
    pub const fn reason(&self) -> NumericalErrorReason {
        self.reason
    }

    /// Returns the name of the matrix (or quantity) that failed.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Error for NumericalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for NumericalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "numerical error on `{}`: {}", self.target, self.reason)?;
        if let Some(ratio) = self.pivot_ratio {
            write!(f, " (pivot ratio={ratio:e})")?;
        }
        Ok(())
    }
}

/// Error object returned when config integrity verification failed.
///
/// This error maintains a path to the component that is actually erroneous
/// in the nested components.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct VerifyError {
    components: Vec<String>,
    reason: String,
}

impl VerifyError {
    /// Makes verification error for an invalid variable `component`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pefilter::error::*;
    /// let err = VerifyError::new("filter_order", "must be positive");
    /// assert_eq!(
    ///     format!("{}", err),
    ///     "verification error: `filter_order` is not valid. reason: must be positive"
    /// );
    /// ```
    pub fn new(component: &str, reason: &str) -> Self {
        Self {
            components: vec![component.to_owned()],
            reason: reason.to_owned(),
        }
    }

    /// Prepends the name of an enclosing component to the error location.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pefilter::error::*;
    /// let err = VerifyError::new("start", "must be positive");
    /// let err = err.within("training_window");
    /// assert_eq!(err.path(), "training_window.start");
    /// ```
    #[must_use]
    pub fn within(self, component: &str) -> Self {
        let mut components = self.components;
        let reason = self.reason;
        components.push(component.to_owned());
        Self { components, reason }
    }

    /// Gets dot-separated path string for the error location.
    pub fn path(&self) -> String {
        let mut path = String::new();
        for (i, name) in self.components.iter().rev().enumerate() {
            if i != 0 {
                path.push('.');
            }
            path.push_str(name);
        }
        path
    }
}

impl Error for VerifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verification error: `{}` is not valid. reason: {}",
            self.path(),
            self.reason
        )
    }
}

/// Trait for verifiable structs.
pub trait Verify: seal_verify::Sealed {
    /// Verifies there's no internal data inconsistency.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError` if there's an invalid variable.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pefilter::error::*;
    /// # use pefilter::config::Estimator;
    /// let mut config = Estimator::default();
    /// config.filter_order = 0; // invalid setting
    /// assert!(config.verify().is_err());
    ///
    /// config.filter_order = 4;
    /// assert!(config.verify().is_ok());
    /// ```
    fn verify(&self) -> Result<(), VerifyError>;
}

/// A wrapping function to make it compatible with "?" operator.
pub(crate) fn verify_macro_impl(cond: bool, varname: &str, msg: &str) -> Result<(), VerifyError> {
    if !cond {
        return Err(VerifyError::new(varname, msg));
    }
    Ok(())
}

/// Checks if `$cond` is true and do `return Err(...)` if so.
///
/// An error object `VerifyErr` is constructed using `$varname` and
/// `$msg` that are formatted using the extra args (`$args`).
macro_rules! verify_true {
    ($varname:literal, $cond:expr, $msg:literal, $($args: expr),*) => {
        crate::error::verify_macro_impl(
            $cond,
            &format!($varname, $($args),*),
            &format!($msg, $($args),*),
        )
    };
    ($varname:literal, $cond:expr, $msg:literal) => {
        verify_true!($varname, $cond, $msg,)
    }
}
pub(crate) use verify_true;

/// Checks if `$actual` is in the range, and emits err with default msgs if not.
///
/// An error is constructed using the same way as [`verify_true`].
macro_rules! verify_range {
    ($varname: literal, $actual:expr, $lowlimit:tt ..= $highlimit:tt) => {
        verify_range!($varname, $actual, ($lowlimit)..)
            .and_then(|()| verify_range!($varname, $actual, ..=($highlimit)))
    };
    ($varname: literal, $actual:expr, $lowlimit:tt ..) => {{
        #[allow(unused_parens)]
        let limit = $lowlimit;
        verify_true!(
            $varname,
            $actual >= limit,
            "must be greater than or equal to {limit}"
        )
    }};
    ($varname: literal, $actual:expr, ..= $highlimit:tt) => {{
        #[allow(unused_parens)]
        let limit = $highlimit;
        verify_true!(
            $varname,
            $actual <= limit,
            "must be less than or equal to {limit}"
        )
    }};
}
pub(crate) use verify_range;

/// Enum for every error the estimation pipeline can return.
#[non_exhaustive]
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, PartialEq)]
pub enum PefError {
    /// An index or window parameter violates its bounds.
    Range(RangeError),
    /// Arrays passed together have inconsistent lengths.
    Size(SizeError),
    /// A matrix inversion or a linear solve failed.
    Numerical(NumericalError),
    /// The estimator configuration is invalid.
    Config(VerifyError),
}

impl fmt::Display for PefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(e) => e.fmt(f),
            Self::Size(e) => e.fmt(f),
            Self::Numerical(e) => e.fmt(f),
            Self::Config(e) => e.fmt(f),
        }
    }
}

impl Error for PefError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Range(e) => Some(e),
            Self::Size(e) => Some(e),
            Self::Numerical(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<RangeError> for PefError {
    fn from(e: RangeError) -> Self {
        Self::Range(e)
    }
}

impl From<SizeError> for PefError {
    fn from(e: SizeError) -> Self {
        Self::Size(e)
    }
}

impl From<NumericalError> for PefError {
    fn from(e: NumericalError) -> Self {
        Self::Numerical(e)
    }
}

impl From<VerifyError> for PefError {
    fn from(e: VerifyError) -> Self {
        Self::Config(e)
    }
}

mod seal_verify {
    pub trait Sealed {}

    impl Sealed for crate::config::Estimator {}
    impl Sealed for crate::config::NoiseWindow {}
    impl Sealed for crate::config::TrainingWindow {}
}
