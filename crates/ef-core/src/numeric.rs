use crate::EfError;

/// Floating point type used throughout the compiler
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, EfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EfError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, EfError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(EfError::InvalidParameter {
            what,
            value: v,
            reason: "must not be negative",
        });
    }
    Ok(v)
}

/// Largest finite sample, `None` for an empty slice or all non-finite input.
pub fn finite_max(values: &[Real]) -> Option<Real> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.map_or(v, |m: Real| m.max(v))))
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[Real]) -> Option<Real> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<Real>() / values.len() as Real)
    }
}
