//! Profile binding: resolves profile keywords against the reduced series
//! table and applies role-specific semantics.

use ef_core::{Real, finite_max};
use ef_graph::ConversionFactor;
use ef_spec::{Cell, CompileOptions};

use crate::context::{CompileContext, split_list};
use crate::error::{RowError, Side};
use crate::report::RowNotes;

/// Source availability profile, normalized to at most 1.0.
///
/// Returns `None` when no keyword is given or the keyword is not in the
/// table. Non-finite and negative samples become 0.0.
pub fn bind_source_profile(
    keyword: Option<&str>,
    ctx: &CompileContext<'_>,
    notes: &mut RowNotes,
) -> Result<Option<Vec<Real>>, RowError> {
    let Some(mut values) = lookup_optional(keyword, ctx, notes)? else {
        return Ok(None);
    };
    sanitize_non_finite(&mut values, notes);

    let negatives = values.iter().filter(|v| **v < 0.0).count();
    if negatives > 0 {
        values.iter_mut().filter(|v| **v < 0.0).for_each(|v| *v = 0.0);
        notes.warn(format!("{negatives} negative samples clipped to 0"));
    }

    if let Some(peak) = finite_max(&values) {
        if peak > 1.0 {
            values.iter_mut().for_each(|v| *v /= peak);
            notes.warn(format!("profile normalized by its peak {peak}"));
        }
    }
    Ok(Some(values))
}

/// Sink demand profile, values kept as given apart from non-finite samples.
pub fn bind_sink_profile(
    keyword: Option<&str>,
    ctx: &CompileContext<'_>,
    notes: &mut RowNotes,
) -> Result<Option<Vec<Real>>, RowError> {
    let Some(mut values) = lookup_optional(keyword, ctx, notes)? else {
        return Ok(None);
    };
    sanitize_non_finite(&mut values, notes);
    Ok(Some(values))
}

/// Capacity for a sink whose demand profile comes without one: the peak
/// demand times the configured buffer.
pub fn sink_auto_capacity(values: &[Real], options: &CompileOptions, notes: &mut RowNotes) -> Real {
    let peak = finite_max(values).unwrap_or(0.0).max(0.0);
    let capacity = peak * options.sink_capacity_buffer;
    notes.defaulted("nominal_capacity", capacity);
    if capacity == 0.0 {
        notes.warn("demand profile is all zero");
    }
    capacity
}

/// Conversion factors for one converter side.
///
/// `cell` holds numbers or profile keywords joined by the factor
/// delimiter; an absent cell means 1.0 for every bus. The factor count must
/// equal `buses`.
pub fn bind_factors(
    cell: Option<&Cell>,
    side: Side,
    buses: usize,
    ctx: &CompileContext<'_>,
    notes: &mut RowNotes,
) -> Result<Vec<ConversionFactor>, RowError> {
    let Some(cell) = cell else {
        let field = match side {
            Side::Input => "input_conversion_factors",
            Side::Output => "output_conversion_factors",
        };
        notes.defaulted(field, 1.0);
        return Ok(vec![ConversionFactor::Constant(1.0); buses]);
    };

    let text = cell.to_text();
    let tokens: Vec<&str> = split_list(&text, ctx.options.factor_delimiter).collect();
    if tokens.len() != buses {
        return Err(RowError::ArityMismatch {
            side,
            buses,
            factors: tokens.len(),
        });
    }

    tokens
        .iter()
        .map(|token| bind_factor(token, ctx))
        .collect()
}

fn bind_factor(token: &str, ctx: &CompileContext<'_>) -> Result<ConversionFactor, RowError> {
    if let Some(v) = parse_number(token) {
        if v <= 0.0 {
            return Err(RowError::invalid("conversion factor", v, "must be positive"));
        }
        return Ok(ConversionFactor::Constant(v));
    }
    let values = lookup(token, ctx)?.ok_or_else(|| RowError::UnknownProfileKeyword {
        keyword: token.to_string(),
    })?;
    if let Some((t, v)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !(v.is_finite() && **v > 0.0))
    {
        return Err(RowError::invalid(
            &format!("conversion factor '{token}' at step {t}"),
            v,
            "must be finite and positive",
        ));
    }
    Ok(ConversionFactor::Series(values))
}

/// Finite number in either decimal notation (`0.35` or `0,35`).
pub fn parse_number(token: &str) -> Option<Real> {
    let token = token.trim();
    let parsed = token
        .parse::<Real>()
        .ok()
        .or_else(|| {
            if token.contains(',') && !token.contains('.') {
                token.replacen(',', ".", 1).parse::<Real>().ok()
            } else {
                None
            }
        })?;
    parsed.is_finite().then_some(parsed)
}

fn lookup_optional(
    keyword: Option<&str>,
    ctx: &CompileContext<'_>,
    notes: &mut RowNotes,
) -> Result<Option<Vec<Real>>, RowError> {
    let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    let found = lookup(keyword, ctx)?;
    if found.is_none() {
        notes.warn(format!("profile '{keyword}' not found, row left without profile"));
    }
    Ok(found)
}

/// Column by keyword, length-checked against the horizon.
///
/// A column set aside before reduction reports its original length against
/// the unreduced index.
fn lookup(keyword: &str, ctx: &CompileContext<'_>) -> Result<Option<Vec<Real>>, RowError> {
    if let Some(&actual) = ctx.misaligned.get(keyword) {
        return Err(RowError::ProfileLengthMismatch {
            expected: ctx.full_len,
            actual,
        });
    }
    let Some(values) = ctx.table.get(keyword) else {
        return Ok(None);
    };
    if values.len() != ctx.horizon {
        return Err(RowError::ProfileLengthMismatch {
            expected: ctx.horizon,
            actual: values.len(),
        });
    }
    Ok(Some(values.to_vec()))
}

fn sanitize_non_finite(values: &mut [Real], notes: &mut RowNotes) {
    let mut replaced = 0;
    for v in values.iter_mut().filter(|v| !v.is_finite()) {
        *v = 0.0;
        replaced += 1;
    }
    if replaced > 0 {
        notes.warn(format!("{replaced} non-finite samples replaced by 0"));
    }
}
