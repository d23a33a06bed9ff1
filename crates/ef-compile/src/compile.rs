//! Model compilation: document -> reduced time base -> validated rows ->
//! immutable graph plus build report.

use std::collections::HashSet;

use ef_graph::{FlowAttrs, Graph, GraphBuilder, NodeKind};
use ef_spec::{BusDef, ConverterDef, EndpointDef, ModelSpec, validate_spec};
use ef_ts::{TimeIndex, reduce};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::context::CompileContext;
use crate::error::{CompileResult, RowError};
use crate::report::{BuildReport, RowNotes, RowOutcome, Table};
use crate::rows::{
    ValidatedConverter, ValidatedEndpoint, require_label, validate_converter, validate_sink,
    validate_source,
};

/// Output of a successful compile, handed to the optimization engine.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    pub graph: Graph,
    pub report: BuildReport,
    /// Active (possibly reduced) time index; every profile spans it.
    pub time_index: TimeIndex,
}

/// `None` for a skipped row, otherwise the notes and validation result.
type Checked<T> = Option<(RowNotes, Result<T, RowError>)>;

/// Compile a model document.
///
/// Fails only on problems that affect the whole model: an invalid
/// document, bad reduction settings or unusable time-series data. Row
/// problems reject the row and are listed in the report.
pub fn compile(spec: &ModelSpec) -> CompileResult<CompiledModel> {
    validate_spec(spec)?;
    let strategy = spec.settings.reduction.resolve()?;
    let full_index = spec.settings.time_index.build()?;
    info!(
        model = %spec.name,
        periods = full_index.len(),
        strategy = strategy.name(),
        "compiling model"
    );

    let reduction = reduce(&full_index, &spec.timeseries, &strategy)?;
    let horizon = reduction.index.len();
    let options = &spec.settings.options;

    let mut report = BuildReport::new(&spec.name, reduction.stats.clone());
    let mut builder = GraphBuilder::new(horizon);
    let mut ctx = CompileContext::new(options, &reduction.table, horizon)
        .with_misaligned(full_index.len(), reduction.misaligned.clone());
    add_buses(&spec.buses, &mut builder, &mut ctx, &mut report);

    let parallel = options.parallel_validation;
    let sources = check_rows(&spec.sources, |r| r.include, parallel, |r, n| {
        validate_source(r, &ctx, n)
    });
    let sinks = check_rows(&spec.sinks, |r| r.include, parallel, |r, n| {
        validate_sink(r, &ctx, n)
    });
    let converters = check_rows(&spec.converters, |r| r.include, parallel, |r, n| {
        validate_converter(r, &ctx, n)
    });

    add_endpoints(
        Table::Sources,
        &spec.sources,
        sources,
        &mut builder,
        &mut report,
    );
    add_endpoints(Table::Sinks, &spec.sinks, sinks, &mut builder, &mut report);
    add_converters(&spec.converters, converters, &mut builder, &mut report);

    let graph = builder.build()?;
    info!(
        nodes = graph.nodes().len(),
        flows = graph.flows().len(),
        horizon,
        rejected = report.rejected().count(),
        "model compiled"
    );

    Ok(CompiledModel {
        graph,
        report,
        time_index: reduction.index,
    })
}

/// Validate rows independently, in parallel when enabled. Results keep
/// row order either way.
fn check_rows<R, T, F>(
    rows: &[R],
    include: fn(&R) -> bool,
    parallel: bool,
    check: F,
) -> Vec<Checked<T>>
where
    R: Sync,
    T: Send,
    F: Fn(&R, &mut RowNotes) -> Result<T, RowError> + Sync,
{
    let run = |row: &R| {
        if !include(row) {
            return None;
        }
        let mut notes = RowNotes::default();
        let result = check(row, &mut notes);
        Some((notes, result))
    };
    if parallel {
        rows.par_iter().map(run).collect()
    } else {
        rows.iter().map(run).collect()
    }
}

fn add_buses(
    rows: &[BusDef],
    builder: &mut GraphBuilder,
    ctx: &mut CompileContext<'_>,
    report: &mut BuildReport,
) {
    let mut seen = HashSet::new();
    for (i, row) in rows.iter().enumerate() {
        let label = row.label.trim();
        if !row.include {
            ctx.register_excluded_bus(label);
            record(report, Table::Buses, i, label, RowOutcome::Skipped, RowNotes::default());
            continue;
        }
        if let Err(err) = require_label(label) {
            record(report, Table::Buses, i, label, RowOutcome::Rejected(err), RowNotes::default());
            continue;
        }
        if !seen.insert(label) {
            let err = RowError::DuplicateLabel {
                label: label.to_string(),
            };
            record(report, Table::Buses, i, label, RowOutcome::Rejected(err), RowNotes::default());
            continue;
        }
        let id = builder.add_node(label, NodeKind::Bus);
        ctx.register_bus(label, id);
        record(report, Table::Buses, i, label, RowOutcome::Materialized, RowNotes::default());
    }
}

fn add_endpoints(
    table: Table,
    rows: &[EndpointDef],
    checked: Vec<Checked<ValidatedEndpoint>>,
    builder: &mut GraphBuilder,
    report: &mut BuildReport,
) {
    let mut seen = HashSet::new();
    for (i, (row, outcome)) in rows.iter().zip(checked).enumerate() {
        let (notes, endpoint) = match outcome {
            None => {
                record(report, table, i, &row.label, RowOutcome::Skipped, RowNotes::default());
                continue;
            }
            Some((notes, Err(err))) => {
                record(report, table, i, &row.label, RowOutcome::Rejected(err), notes);
                continue;
            }
            Some((notes, Ok(endpoint))) => (notes, endpoint),
        };
        if !seen.insert(endpoint.label.clone()) {
            let err = RowError::DuplicateLabel {
                label: endpoint.label.clone(),
            };
            record(report, table, i, &endpoint.label, RowOutcome::Rejected(err), notes);
            continue;
        }

        if table == Table::Sources {
            let node = builder.add_node(&endpoint.label, NodeKind::Source);
            builder.add_flow(node, endpoint.bus, endpoint.flow);
        } else {
            let node = builder.add_node(&endpoint.label, NodeKind::Sink);
            builder.add_flow(endpoint.bus, node, endpoint.flow);
        }
        record(report, table, i, &endpoint.label, RowOutcome::Materialized, notes);
    }
}

fn add_converters(
    rows: &[ConverterDef],
    checked: Vec<Checked<ValidatedConverter>>,
    builder: &mut GraphBuilder,
    report: &mut BuildReport,
) {
    let table = Table::Converters;
    let mut seen = HashSet::new();
    for (i, (row, outcome)) in rows.iter().zip(checked).enumerate() {
        let (notes, conv) = match outcome {
            None => {
                record(report, table, i, &row.label, RowOutcome::Skipped, RowNotes::default());
                continue;
            }
            Some((notes, Err(err))) => {
                record(report, table, i, &row.label, RowOutcome::Rejected(err), notes);
                continue;
            }
            Some((notes, Ok(conv))) => (notes, conv),
        };
        if !seen.insert(conv.label.clone()) {
            let err = RowError::DuplicateLabel {
                label: conv.label.clone(),
            };
            record(report, table, i, &conv.label, RowOutcome::Rejected(err), notes);
            continue;
        }

        let node = builder.add_node(&conv.label, NodeKind::Converter);
        for (bus, factor) in conv.inputs {
            let flow = builder.add_flow(bus, node, FlowAttrs::default());
            builder.set_conversion_factor(node, flow, factor);
        }
        let mut main_flow = Some(conv.main_flow);
        for (bus, factor) in conv.outputs {
            // capacity, cost and operating terms sit on the first output
            let attrs = main_flow.take().unwrap_or_default();
            let flow = builder.add_flow(node, bus, attrs);
            builder.set_conversion_factor(node, flow, factor);
        }
        record(report, table, i, &conv.label, RowOutcome::Materialized, notes);
    }
}

fn record(
    report: &mut BuildReport,
    table: Table,
    row: usize,
    label: &str,
    outcome: RowOutcome,
    notes: RowNotes,
) {
    for d in &notes.defaulted {
        debug!(%table, label, field = d.field, value = d.value, "defaulted field");
    }
    for w in &notes.warnings {
        warn!(%table, label, "{w}");
    }
    match &outcome {
        RowOutcome::Materialized => debug!(%table, label, "row materialized"),
        RowOutcome::Skipped => debug!(%table, label, "row skipped"),
        RowOutcome::Rejected(err) => {
            warn!(%table, label, class = ?err.class(), reason = %err, "row rejected")
        }
    }
    report.push(table, row, label, outcome, notes);
}
