//! Capacity resolution: turns a row's capacity columns into exactly one
//! [`CapacityMode`], or none when the row leaves capacity open.

use ef_core::{Real, annualized_cost, ensure_finite, ensure_non_negative};
use ef_graph::{CapacityMode, InvestmentSpec};
use ef_spec::{CapacityDef, CompileOptions};

use crate::error::RowError;
use crate::report::RowNotes;

/// Resolve capacity inputs.
///
/// With `investment` set the result is always an investment; missing bounds
/// and costs fall back to defaults, each recorded in `notes`. Otherwise an
/// explicit `nominal_capacity` wins over a positive `existing`; with
/// neither the capacity stays unresolved.
pub fn resolve_capacity(
    def: &CapacityDef,
    options: &CompileOptions,
    notes: &mut RowNotes,
) -> Result<Option<CapacityMode>, RowError> {
    if def.investment {
        let spec = resolve_investment(def, options, notes)?;
        return Ok(Some(CapacityMode::Investment(spec)));
    }

    let has_investment_terms = def.invest_min.is_some()
        || def.invest_max.is_some()
        || def.investment_costs.is_some();
    if has_investment_terms {
        notes.warn("investment columns ignored because investment is off");
    }

    if let Some(v) = def.nominal_capacity {
        let v = ensure_finite(v, "nominal_capacity")?;
        if v <= 0.0 {
            return Err(RowError::invalid("nominal_capacity", v, "must be positive"));
        }
        return Ok(Some(CapacityMode::Fixed(v)));
    }

    match def.existing {
        Some(v) => {
            let v = ensure_non_negative(v, "existing")?;
            Ok((v > 0.0).then_some(CapacityMode::Fixed(v)))
        }
        None => Ok(None),
    }
}

fn resolve_investment(
    def: &CapacityDef,
    options: &CompileOptions,
    notes: &mut RowNotes,
) -> Result<InvestmentSpec, RowError> {
    let existing = match def.existing.or(def.nominal_capacity) {
        Some(v) => v,
        None => defaulted(notes, "existing", 0.0),
    };
    let minimum = match def.invest_min {
        Some(v) => v,
        None => defaulted(notes, "invest_min", 0.0),
    };
    let maximum = match def.invest_max {
        Some(v) => v,
        None => defaulted(notes, "invest_max", options.invest_max_fallback),
    };
    let capital = match def.investment_costs {
        Some(v) => v,
        None => defaulted(notes, "investment_costs", 0.0),
    };

    let existing = ensure_non_negative(existing, "existing")?;
    let minimum = ensure_non_negative(minimum, "invest_min")?;
    let maximum = ensure_non_negative(maximum, "invest_max")?;
    let capital = ensure_non_negative(capital, "investment_costs")?;
    if minimum > maximum {
        return Err(RowError::invalid(
            "invest_min",
            minimum,
            &format!("exceeds invest_max {maximum}"),
        ));
    }

    let ep_costs = annualized_cost(capital, def.lifetime, def.interest_rate)?;
    Ok(InvestmentSpec {
        existing,
        minimum,
        maximum,
        ep_costs,
    })
}

pub(crate) fn defaulted(notes: &mut RowNotes, field: &'static str, value: Real) -> Real {
    notes.defaulted(field, value);
    value
}
