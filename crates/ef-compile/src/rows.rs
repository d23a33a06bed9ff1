//! Row validation: each source, sink and converter row becomes a fully
//! resolved value that materializes into the graph without further checks.

use ef_core::{NodeId, Real, ensure_finite};
use ef_graph::{CapacityMode, ConversionFactor, FlowAttrs, FlowProfile};
use ef_spec::{ConverterDef, EndpointDef};

use crate::capacity::resolve_capacity;
use crate::context::CompileContext;
use crate::error::{RowError, Side};
use crate::operation::resolve_operation;
use crate::profile::{bind_factors, bind_sink_profile, bind_source_profile, sink_auto_capacity};
use crate::report::RowNotes;

/// A source or sink with its single flow resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEndpoint {
    pub label: String,
    pub bus: NodeId,
    pub flow: FlowAttrs,
}

/// One converter side: bus and its conversion factor, in list order.
pub type ConverterPort = (NodeId, ConversionFactor);

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConverter {
    pub label: String,
    pub inputs: Vec<ConverterPort>,
    pub outputs: Vec<ConverterPort>,
    /// Attributes of the first output flow; all other flows carry none.
    pub main_flow: FlowAttrs,
}

pub fn validate_source(
    row: &EndpointDef,
    ctx: &CompileContext<'_>,
    notes: &mut RowNotes,
) -> Result<ValidatedEndpoint, RowError> {
    let label = require_label(&row.label)?;
    let bus = ctx.bus(&row.bus)?;
    let variable_costs = ensure_finite(row.variable_costs, "variable_costs")?;
    let capacity = resolve_capacity(&row.capacity, ctx.options, notes)?;
    let profile = bind_source_profile(row.profile_column.as_deref(), ctx, notes)?;

    if profile.is_some() && capacity.is_none() {
        return Err(RowError::MissingCapacity {
            keyword: row.profile_column.clone().unwrap_or_default(),
        });
    }
    let operation = resolve_operation(&row.limits, &row.nonconvex, capacity, ctx.horizon, notes)?;

    Ok(ValidatedEndpoint {
        label,
        bus,
        flow: FlowAttrs {
            capacity,
            variable_costs,
            profile: profile.map(FlowProfile::Max),
            limits: operation.limits,
            nonconvex: operation.nonconvex,
        },
    })
}

pub fn validate_sink(
    row: &EndpointDef,
    ctx: &CompileContext<'_>,
    notes: &mut RowNotes,
) -> Result<ValidatedEndpoint, RowError> {
    let label = require_label(&row.label)?;
    let bus = ctx.bus(&row.bus)?;
    let variable_costs = ensure_finite(row.variable_costs, "variable_costs")?;
    let mut capacity = resolve_capacity(&row.capacity, ctx.options, notes)?;
    let profile = bind_sink_profile(row.profile_column.as_deref(), ctx, notes)?;

    if let (Some(values), None) = (&profile, capacity) {
        capacity = Some(CapacityMode::Fixed(sink_auto_capacity(
            values,
            ctx.options,
            notes,
        )));
    }
    let operation = resolve_operation(&row.limits, &row.nonconvex, capacity, ctx.horizon, notes)?;
    if profile.is_some() && operation.limits.is_some() {
        notes.warn("min/max have no effect on a fixed demand profile");
    }

    Ok(ValidatedEndpoint {
        label,
        bus,
        flow: FlowAttrs {
            capacity,
            variable_costs,
            profile: profile.map(FlowProfile::Fix),
            limits: operation.limits,
            nonconvex: operation.nonconvex,
        },
    })
}

pub fn validate_converter(
    row: &ConverterDef,
    ctx: &CompileContext<'_>,
    notes: &mut RowNotes,
) -> Result<ValidatedConverter, RowError> {
    let label = require_label(&row.label)?;
    let input_buses = ctx.bus_list(&row.input_bus)?;
    if input_buses.is_empty() {
        return Err(RowError::EmptyBusList { side: Side::Input });
    }
    let output_buses = ctx.bus_list(&row.output_bus)?;
    if output_buses.is_empty() {
        return Err(RowError::EmptyBusList { side: Side::Output });
    }

    let input_factors = bind_factors(
        row.input_conversion_factors.as_ref(),
        Side::Input,
        input_buses.len(),
        ctx,
        notes,
    )?;
    let output_factors = match (&row.output_conversion_factors, row.conversion_factor) {
        (None, Some(legacy)) => legacy_factors(legacy, output_buses.len(), notes)?,
        (cell, _) => bind_factors(cell.as_ref(), Side::Output, output_buses.len(), ctx, notes)?,
    };

    let variable_costs = ensure_finite(row.variable_costs, "variable_costs")?;
    let capacity = resolve_capacity(&row.capacity, ctx.options, notes)?;
    let operation = resolve_operation(&row.limits, &row.nonconvex, capacity, ctx.horizon, notes)?;

    Ok(ValidatedConverter {
        label,
        inputs: input_buses.into_iter().zip(input_factors).collect(),
        outputs: output_buses.into_iter().zip(output_factors).collect(),
        main_flow: FlowAttrs {
            capacity,
            variable_costs,
            profile: None,
            limits: operation.limits,
            nonconvex: operation.nonconvex,
        },
    })
}

/// Trimmed, non-empty row label.
pub(crate) fn require_label(label: &str) -> Result<String, RowError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(RowError::EmptyLabel);
    }
    Ok(label.to_string())
}

/// Single legacy `conversion_factor`, applied to every output.
fn legacy_factors(
    value: Real,
    outputs: usize,
    notes: &mut RowNotes,
) -> Result<Vec<ConversionFactor>, RowError> {
    let value = ensure_finite(value, "conversion_factor")?;
    if value <= 0.0 {
        return Err(RowError::invalid("conversion_factor", value, "must be positive"));
    }
    notes.warn("legacy conversion_factor applied to all outputs");
    Ok(vec![ConversionFactor::Constant(value); outputs])
}
