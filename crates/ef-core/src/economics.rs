//! Investment economics: converts an up-front capital cost per unit of
//! capacity into an equivalent periodic (annual) cost.

use crate::numeric::{Real, ensure_finite};
use crate::{EfError, EfResult};

/// Capital recovery factor `r(1+r)^n / ((1+r)^n - 1)`.
///
/// A zero rate degenerates to straight-line recovery `1/n`.
pub fn annuity_factor(interest_rate: Real, lifetime_years: Real) -> EfResult<Real> {
    let r = check_rate(interest_rate)?;
    let n = check_lifetime(lifetime_years)?;
    if r == 0.0 {
        return Ok(1.0 / n);
    }
    let growth = (1.0 + r).powf(n);
    Ok(r * growth / (growth - 1.0))
}

/// Equivalent periodic cost of `capital`.
///
/// When either `lifetime_years` or `interest_rate` is absent the capital is
/// taken as already annualized and returned unchanged. Provided values are
/// validated regardless.
pub fn annualized_cost(
    capital: Real,
    lifetime_years: Option<Real>,
    interest_rate: Option<Real>,
) -> EfResult<Real> {
    let capital = ensure_finite(capital, "investment_costs")?;
    if let Some(n) = lifetime_years {
        check_lifetime(n)?;
    }
    if let Some(r) = interest_rate {
        check_rate(r)?;
    }

    match (lifetime_years, interest_rate) {
        (Some(n), Some(r)) => Ok(capital * annuity_factor(r, n)?),
        _ => Ok(capital),
    }
}

fn check_lifetime(n: Real) -> EfResult<Real> {
    let n = ensure_finite(n, "lifetime")?;
    if n <= 0.0 {
        return Err(EfError::InvalidParameter {
            what: "lifetime",
            value: n,
            reason: "must be positive",
        });
    }
    Ok(n)
}

fn check_rate(r: Real) -> EfResult<Real> {
    let r = ensure_finite(r, "interest_rate")?;
    if r < 0.0 {
        return Err(EfError::InvalidParameter {
            what: "interest_rate",
            value: r,
            reason: "must not be negative",
        });
    }
    Ok(r)
}
