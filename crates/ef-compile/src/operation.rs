//! Operating terms of a unit's main flow: per-unit `min`/`max` and on/off
//! (nonconvex) operation. Both are shares of the flow's capacity, so a row
//! that sets them without one is rejected.

use ef_core::{Real, ensure_non_negative};
use ef_graph::{CapacityMode, FlowLimits, NonConvex};
use ef_spec::{FlowLimitsDef, NonConvexDef};

use crate::capacity::defaulted;
use crate::error::RowError;
use crate::report::RowNotes;

/// Resolved operating terms; `None` where the row leaves them empty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Operation {
    pub limits: Option<FlowLimits>,
    pub nonconvex: Option<NonConvex>,
}

/// Resolve the operating columns of a row whose main flow has `capacity`.
///
/// Step counts refer to steps of the active (possibly reduced) index of
/// `horizon` steps.
pub fn resolve_operation(
    limits: &FlowLimitsDef,
    nonconvex: &NonConvexDef,
    capacity: Option<CapacityMode>,
    horizon: usize,
    notes: &mut RowNotes,
) -> Result<Operation, RowError> {
    let limits = resolve_limits(limits, capacity, notes)?;
    let nonconvex = resolve_nonconvex(nonconvex, capacity, horizon, notes)?;
    if nonconvex.is_none() && limits.is_some_and(|l| l.min > 0.0) {
        notes.warn("min > 0 without on/off operation keeps the flow running in every step");
    }
    Ok(Operation { limits, nonconvex })
}

fn resolve_limits(
    def: &FlowLimitsDef,
    capacity: Option<CapacityMode>,
    notes: &mut RowNotes,
) -> Result<Option<FlowLimits>, RowError> {
    if def.is_empty() {
        return Ok(None);
    }
    if capacity.is_none() {
        return Err(RowError::CapacityRequired {
            field: "min/max".into(),
        });
    }
    let min = match def.min {
        Some(v) => ensure_non_negative(v, "min")?,
        None => defaulted(notes, "min", 0.0),
    };
    let max = match def.max {
        Some(v) => ensure_non_negative(v, "max")?,
        None => defaulted(notes, "max", 1.0),
    };
    if min > max {
        return Err(RowError::invalid("min", min, &format!("exceeds max {max}")));
    }
    Ok(Some(FlowLimits { min, max }))
}

fn resolve_nonconvex(
    def: &NonConvexDef,
    capacity: Option<CapacityMode>,
    horizon: usize,
    notes: &mut RowNotes,
) -> Result<Option<NonConvex>, RowError> {
    if def.is_empty() {
        return Ok(None);
    }
    if capacity.is_none() {
        return Err(RowError::CapacityRequired {
            field: "on/off operation".into(),
        });
    }

    let startup_costs = match def.startup_costs {
        Some(v) => ensure_non_negative(v, "startup_costs")?,
        None => defaulted(notes, "startup_costs", 0.0),
    };
    let shutdown_costs = match def.shutdown_costs {
        Some(v) => ensure_non_negative(v, "shutdown_costs")?,
        None => defaulted(notes, "shutdown_costs", 0.0),
    };
    let initial_status = match def.initial_status {
        Some(v) if v == 0.0 => false,
        Some(v) if v == 1.0 => true,
        Some(v) => return Err(RowError::invalid("initial_status", v, "must be 0 or 1")),
        None => defaulted(notes, "initial_status", 0.0) > 0.0,
    };

    let minimum_uptime = steps(def.minimum_uptime, "minimum_uptime")?.unwrap_or(0);
    let minimum_downtime = steps(def.minimum_downtime, "minimum_downtime")?.unwrap_or(0);
    for (field, value) in [
        ("minimum_uptime", minimum_uptime),
        ("minimum_downtime", minimum_downtime),
    ] {
        if value as usize > horizon {
            notes.warn(format!("{field} of {value} steps exceeds the horizon of {horizon}"));
        }
    }

    Ok(Some(NonConvex {
        minimum_uptime,
        minimum_downtime,
        startup_costs,
        shutdown_costs,
        maximum_startups: steps(def.maximum_startups, "maximum_startups")?,
        maximum_shutdowns: steps(def.maximum_shutdowns, "maximum_shutdowns")?,
        initial_status,
    }))
}

/// Whole, non-negative count.
fn steps(value: Option<Real>, field: &'static str) -> Result<Option<u32>, RowError> {
    let Some(v) = value else {
        return Ok(None);
    };
    let v = ensure_non_negative(v, field)?;
    if v.fract() != 0.0 || v > Real::from(u32::MAX) {
        return Err(RowError::invalid(field, v, "must be a whole number"));
    }
    Ok(Some(v as u32))
}
