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

//! Dense solver for the normal equations.

use super::config::SolveMethod;
use super::constant::MIN_PIVOT_RATIO;
use super::covariance::checked_inverse;
use super::covariance::lu_pivot_ratio;
use super::error::NumericalError;
use super::error::NumericalErrorReason;
use super::normal::NormalEquations;
use super::predict::Filter;

/// Solves `A m = b` and returns the filter with coefficients `m`.
///
/// No regularization is applied. When `A` is singular, the caller should
/// lower the filter order or widen the windows.
///
/// # Errors
///
/// Returns `NumericalError` if `A` is singular or ill-conditioned.
pub fn solve(eqs: &NormalEquations, method: SolveMethod) -> Result<Filter, NumericalError> {
    let coefs = match method {
        SolveMethod::Lu => {
            let lu = eqs.a().clone().lu();
            let ratio = lu_pivot_ratio(&lu);
            if !(ratio >= MIN_PIVOT_RATIO) {
                return Err(
                    NumericalError::new("system", NumericalErrorReason::SingularSystem)
                        .with_pivot_ratio(ratio),
                );
            }
            lu.solve(eqs.b()).ok_or_else(|| {
                NumericalError::new("system", NumericalErrorReason::SingularSystem)
            })?
        }
        SolveMethod::Inverse => checked_inverse(eqs.a(), "system")? * eqs.b(),
    };
    if coefs.iter().any(|x| !x.is_finite()) {
        return Err(NumericalError::new("system", NumericalErrorReason::NotFinite));
    }
    Ok(Filter::new(coefs.iter().copied().collect()))
}
