//! Ordered, strictly increasing timestamps.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use ef_core::Real;
use serde::Serialize;

use crate::error::{TsError, TsResult};

/// Minimum share of consecutive intervals that must equal the modal
/// interval before a non-identity reduction is applied.
pub const REGULARITY_THRESHOLD: Real = 0.8;

/// Largest index a regular time index may generate (about 1900 years of
/// hourly stamps).
pub const MAX_PERIODS: usize = 1 << 24;

/// Time index of a model: non-empty and strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TimeIndex {
    stamps: Vec<NaiveDateTime>,
}

impl TimeIndex {
    /// Validate and wrap an explicit list of timestamps.
    pub fn new(stamps: Vec<NaiveDateTime>) -> TsResult<Self> {
        if stamps.is_empty() {
            return Err(TsError::EmptyIndex);
        }
        if let Some(position) = stamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TsError::NotIncreasing {
                position: position + 1,
            });
        }
        Ok(Self { stamps })
    }

    /// `periods` stamps starting at `start`, `step` apart.
    ///
    /// The last stamp is computed before anything is allocated, so a
    /// `periods` beyond [`MAX_PERIODS`] or past the calendar range is an
    /// error rather than an allocation failure.
    pub fn regular(start: NaiveDateTime, periods: usize, step: TimeDelta) -> TsResult<Self> {
        if step <= TimeDelta::zero() {
            return Err(TsError::InvalidParameter {
                what: "step",
                value: step.to_string(),
            });
        }
        let too_many = || TsError::InvalidParameter {
            what: "periods",
            value: periods.to_string(),
        };
        if periods > MAX_PERIODS {
            return Err(too_many());
        }
        if let Some(last) = periods.checked_sub(1) {
            let last = i32::try_from(last).map_err(|_| too_many())?;
            step.checked_mul(last)
                .and_then(|span| start.checked_add_signed(span))
                .ok_or_else(too_many)?;
        }
        let mut stamps = Vec::with_capacity(periods);
        let mut t = start;
        for i in 0..periods {
            if i > 0 {
                t = t.checked_add_signed(step).ok_or_else(too_many)?;
            }
            stamps.push(t);
        }
        Self::new(stamps)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Always false; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn stamps(&self) -> &[NaiveDateTime] {
        &self.stamps
    }

    pub fn first(&self) -> NaiveDateTime {
        self.stamps[0]
    }

    pub fn last(&self) -> NaiveDateTime {
        self.stamps[self.stamps.len() - 1]
    }

    /// Most frequent spacing between neighbours; ties resolve to the
    /// shortest interval. `None` for a single-stamp index.
    pub fn modal_interval(&self) -> Option<TimeDelta> {
        let mut counts: BTreeMap<TimeDelta, usize> = BTreeMap::new();
        for w in self.stamps.windows(2) {
            *counts.entry(w[1] - w[0]).or_default() += 1;
        }
        let mut best: Option<(TimeDelta, usize)> = None;
        for (step, count) in counts {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((step, count));
            }
        }
        best.map(|(step, _)| step)
    }

    /// Share of intervals equal to the modal interval (1.0 for fewer than
    /// two stamps).
    pub fn regularity(&self) -> Real {
        let intervals = self.stamps.len().saturating_sub(1);
        let Some(modal) = self.modal_interval() else {
            return 1.0;
        };
        let matching = self
            .stamps
            .windows(2)
            .filter(|w| w[1] - w[0] == modal)
            .count();
        matching as Real / intervals as Real
    }

    pub fn ensure_regular(&self, threshold: Real) -> TsResult<()> {
        let share = self.regularity();
        if share + 1e-12 < threshold {
            return Err(TsError::IndexNotRegular { share, threshold });
        }
        Ok(())
    }

    /// Stamps at the given positions, in order. Positions must be strictly
    /// increasing and in bounds.
    pub(crate) fn select(&self, positions: &[usize]) -> Self {
        Self {
            stamps: positions.iter().map(|&p| self.stamps[p]).collect(),
        }
    }
}
