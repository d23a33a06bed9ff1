//! End-to-end compile tests.

use std::path::Path;

use chrono::NaiveDate;
use ef_compile::{CompileError, ErrorClass, RowError, RowOutcome, Side, Table, compile};
use ef_graph::{CapacityMode, ConversionFactor, FlowLimits, FlowProfile, NodeKind};
use ef_spec::{BusDef, Cell, ConverterDef, EndpointDef, ModelSpec, TimeIndexDef};
use ef_ts::TsError;

fn hourly_spec(name: &str, periods: usize) -> ModelSpec {
    let mut spec = ModelSpec::new(name);
    spec.settings.time_index = TimeIndexDef::Regular {
        start: NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        periods,
        freq_minutes: 60,
    };
    spec
}

#[test]
fn unknown_bus_row_is_rejected_and_rest_compiles() {
    let mut spec = hourly_spec("three plus one", 5);
    spec.buses.push(BusDef::new("el"));
    let mut grid = EndpointDef::new("grid", "el");
    grid.capacity.nominal_capacity = Some(50.0);
    spec.sources.push(grid);
    let mut load = EndpointDef::new("load", "el");
    load.profile_column = Some("demand".into());
    spec.sinks.push(load);
    spec.sinks.push(EndpointDef::new("h2_offtake", "hydrogen"));
    spec.timeseries
        .insert("demand", vec![5.2, 4.8, 4.5, 6.2, 7.8]);

    let model = compile(&spec).unwrap();
    assert_eq!(model.graph.nodes().len(), 3);
    assert_eq!(model.graph.flows().len(), 2);

    let rejected: Vec<_> = model.report.rejected().collect();
    assert_eq!(rejected.len(), 1);
    let (row, err) = rejected[0];
    assert_eq!(row.table, Table::Sinks);
    assert_eq!(row.label, "h2_offtake");
    assert_eq!(
        *err,
        RowError::UnknownBusReference {
            bus: "hydrogen".into()
        }
    );
    assert_eq!(err.class(), ErrorClass::Validation);

    let sink = model.graph.find(NodeKind::Sink, "load").unwrap();
    let flow = model.graph.inputs(sink.id).next().unwrap();
    match flow.capacity {
        Some(CapacityMode::Fixed(c)) => assert!((c - 9.36).abs() < 1e-9),
        other => panic!("unexpected capacity {other:?}"),
    }
    let load_report = model.report.row(Table::Sinks, "load").unwrap();
    assert_eq!(load_report.defaulted[0].field, "nominal_capacity");
}

#[test]
fn short_profile_rejected_with_lengths() {
    let mut spec = hourly_spec("week", 168);
    spec.buses.push(BusDef::new("el"));
    let mut wind = EndpointDef::new("wind", "el");
    wind.capacity.nominal_capacity = Some(3.0);
    wind.profile_column = Some("wind".into());
    spec.sources.push(wind);
    spec.timeseries.insert("wind", vec![0.3; 100]);

    let model = compile(&spec).unwrap();
    let (_, err) = model.report.rejected().next().unwrap();
    assert_eq!(
        *err,
        RowError::ProfileLengthMismatch {
            expected: 168,
            actual: 100
        }
    );
    assert_eq!(err.class(), ErrorClass::Data);
    assert_eq!(model.graph.nodes().len(), 1);
}

fn week_with_wind(values: Vec<f64>) -> ModelSpec {
    let mut spec = hourly_spec("week", 168);
    spec.buses.push(BusDef::new("el"));
    let mut wind = EndpointDef::new("wind", "el");
    wind.capacity.nominal_capacity = Some(3.0);
    wind.profile_column = Some("wind".into());
    spec.sources.push(wind);
    let mut load = EndpointDef::new("load", "el");
    load.profile_column = Some("demand".into());
    spec.sinks.push(load);
    spec.timeseries.insert("wind", values);
    spec.timeseries.insert("demand", vec![4.0; 168]);
    spec
}

#[test]
fn long_profile_rejected_under_block_average() {
    let mut spec = week_with_wind(vec![0.3; 200]);
    spec.settings.reduction.strategy = "block_average".into();
    spec.settings.reduction.block_hours = Some(6);

    let model = compile(&spec).unwrap();
    assert_eq!(model.graph.horizon(), 28);
    let rejected: Vec<_> = model.report.rejected().collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].0.label, "wind");
    assert_eq!(
        *rejected[0].1,
        RowError::ProfileLengthMismatch {
            expected: 168,
            actual: 200
        }
    );
    assert!(model.graph.find(NodeKind::Sink, "load").is_some());
}

#[test]
fn short_profile_rejected_under_sampling() {
    let mut spec = week_with_wind(vec![0.3; 167]);
    spec.settings.reduction.strategy = "sampling".into();
    spec.settings.reduction.sampling_factor = Some(2.0);

    let model = compile(&spec).unwrap();
    assert_eq!(model.graph.horizon(), 84);
    let (row, err) = model.report.rejected().next().unwrap();
    assert_eq!(row.label, "wind");
    assert_eq!(
        *err,
        RowError::ProfileLengthMismatch {
            expected: 168,
            actual: 167
        }
    );
}

#[test]
fn converter_arity_mismatch_rejected() {
    let mut spec = hourly_spec("chp", 2);
    for bus in ["gas", "el", "heat"] {
        spec.buses.push(BusDef::new(bus));
    }
    let mut chp = ConverterDef::new("chp", "gas", "el|heat");
    chp.output_conversion_factors = Some(Cell::Number(0.4));
    spec.converters.push(chp);

    let model = compile(&spec).unwrap();
    let (_, err) = model.report.rejected().next().unwrap();
    assert_eq!(
        *err,
        RowError::ArityMismatch {
            side: Side::Output,
            buses: 2,
            factors: 1
        }
    );
    assert_eq!(model.graph.nodes_of(NodeKind::Converter).count(), 0);
}

#[test]
fn converter_investment_sits_on_first_output() {
    let mut spec = hourly_spec("chp", 3);
    for bus in ["gas", "el", "heat"] {
        spec.buses.push(BusDef::new(bus));
    }
    let mut chp = ConverterDef::new("chp", "gas", "el|heat");
    chp.output_conversion_factors = Some(Cell::from("0,35;eta_heat"));
    chp.capacity.investment = true;
    chp.capacity.investment_costs = Some(1000.0);
    chp.capacity.lifetime = Some(20.0);
    chp.capacity.interest_rate = Some(0.0);
    chp.variable_costs = 0.01;
    spec.converters.push(chp);
    spec.timeseries.insert("eta_heat", vec![0.5, 0.45, 0.5]);

    let model = compile(&spec).unwrap();
    assert!(model.report.is_clean());
    let node = model.graph.find(NodeKind::Converter, "chp").unwrap();
    let outputs: Vec<_> = model.graph.outputs(node.id).collect();
    assert_eq!(outputs.len(), 2);

    let first = outputs[0];
    assert_eq!(model.graph.node(first.to).unwrap().label, "el");
    match first.capacity {
        Some(CapacityMode::Investment(inv)) => {
            assert_eq!(inv.ep_costs, 50.0);
            assert_eq!(inv.maximum, 500.0);
        }
        other => panic!("unexpected capacity {other:?}"),
    }
    assert_eq!(first.variable_costs, 0.01);
    assert!(outputs[1].capacity.is_none());
    assert_eq!(
        node.conversion_factor(outputs[1].id),
        Some(&ConversionFactor::Series(vec![0.5, 0.45, 0.5]))
    );
    let input = model.graph.inputs(node.id).next().unwrap();
    assert_eq!(
        node.conversion_factor(input.id),
        Some(&ConversionFactor::Constant(1.0))
    );
}

#[test]
fn series_factor_with_zero_sample_rejects_the_converter() {
    let mut spec = hourly_spec("hp", 3);
    for bus in ["el", "heat"] {
        spec.buses.push(BusDef::new(bus));
    }
    let mut hp = ConverterDef::new("heat_pump", "el", "heat");
    hp.output_conversion_factors = Some(Cell::from("cop"));
    spec.converters.push(hp);
    spec.timeseries.insert("cop", vec![3.0, 0.0, 3.2]);

    let model = compile(&spec).unwrap();
    assert!(model.graph.find(NodeKind::Converter, "heat_pump").is_none());
    let (row, err) = model.report.rejected().next().unwrap();
    assert_eq!(row.label, "heat_pump");
    assert!(
        matches!(err, RowError::InvalidParameter { what, .. } if what.contains("'cop' at step 1")),
        "{err:?}"
    );
    assert_eq!(err.class(), ErrorClass::Parameter);
}

#[test]
fn operating_terms_reach_the_main_flow_and_report() {
    let mut spec = hourly_spec("unit commitment", 4);
    for bus in ["gas", "el", "heat"] {
        spec.buses.push(BusDef::new(bus));
    }
    let mut chp = ConverterDef::new("chp", "gas", "el|heat");
    chp.output_conversion_factors = Some(Cell::from("0.35;0.5"));
    chp.capacity.nominal_capacity = Some(20.0);
    chp.limits.min = Some(0.4);
    chp.nonconvex.minimum_uptime = Some(2.0);
    chp.nonconvex.startup_costs = Some(150.0);
    spec.converters.push(chp);
    let mut diesel = EndpointDef::new("diesel", "el");
    diesel.limits.max = Some(0.9);
    spec.sources.push(diesel);

    let model = compile(&spec).unwrap();
    let node = model.graph.find(NodeKind::Converter, "chp").unwrap();
    let outputs: Vec<_> = model.graph.outputs(node.id).collect();
    assert_eq!(outputs[0].limits, Some(FlowLimits { min: 0.4, max: 1.0 }));
    let nc = outputs[0].nonconvex.unwrap();
    assert_eq!((nc.minimum_uptime, nc.startup_costs), (2, 150.0));
    assert!(outputs[1].limits.is_none() && outputs[1].nonconvex.is_none());
    assert!(model.graph.inputs(node.id).all(|f| f.nonconvex.is_none()));

    let row = model.report.row(Table::Converters, "chp").unwrap();
    assert_eq!(row.outcome, RowOutcome::Materialized);
    let fields: Vec<_> = row.defaulted.iter().map(|d| d.field).collect();
    assert_eq!(
        fields,
        ["input_conversion_factors", "max", "shutdown_costs", "initial_status"]
    );

    let (row, err) = model.report.rejected().next().unwrap();
    assert_eq!(row.label, "diesel");
    assert_eq!(
        *err,
        RowError::CapacityRequired {
            field: "min/max".into()
        }
    );

    let json = serde_json::to_value(&model.graph).unwrap();
    let main = json["flows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["nonconvex"].is_object())
        .unwrap();
    assert_eq!(main["nonconvex"]["startup_costs"], 150.0);
    assert_eq!(main["limits"]["min"], 0.4);
}

#[test]
fn duplicate_labels_rejected_per_kind() {
    let mut spec = hourly_spec("dup", 1);
    spec.buses.push(BusDef::new("el"));
    spec.buses.push(BusDef::new("el"));
    let mut a = EndpointDef::new("el", "el");
    a.capacity.nominal_capacity = Some(1.0);
    spec.sources.push(a.clone());
    spec.sources.push(a);

    let model = compile(&spec).unwrap();
    // bus "el" and source "el" coexist; the second of each is rejected
    assert_eq!(model.graph.nodes().len(), 2);
    let dups: Vec<_> = model
        .report
        .rejected()
        .map(|(row, _)| (row.table, row.row))
        .collect();
    assert_eq!(dups, vec![(Table::Buses, 1), (Table::Sources, 1)]);
}

#[test]
fn blank_label_rejects_only_its_row() {
    let mut spec = hourly_spec("blank", 2);
    spec.buses.push(BusDef::new("el"));
    spec.buses.push(BusDef::new(" "));
    let mut grid = EndpointDef::new("grid", "el");
    grid.capacity.nominal_capacity = Some(10.0);
    spec.sources.push(grid);
    spec.sinks.push(EndpointDef::new("", "el"));

    let model = compile(&spec).unwrap();
    assert_eq!(model.graph.nodes().len(), 2);
    let rejected: Vec<_> = model
        .report
        .rejected()
        .map(|(row, err)| (row.table, row.row, err.clone()))
        .collect();
    assert_eq!(
        rejected,
        vec![
            (Table::Buses, 1, RowError::EmptyLabel),
            (Table::Sinks, 0, RowError::EmptyLabel),
        ]
    );
    assert_eq!(rejected[0].2.class(), ErrorClass::Validation);
}

#[test]
fn excluded_rows_are_skipped() {
    let mut spec = hourly_spec("skip", 1);
    spec.buses.push(BusDef::new("el"));
    let mut h2 = BusDef::new("h2");
    h2.include = false;
    spec.buses.push(h2);
    let mut off = EndpointDef::new("old_plant", "el");
    off.include = false;
    spec.sources.push(off);
    spec.sinks.push(EndpointDef::new("electrolysis", "h2"));

    let model = compile(&spec).unwrap();
    assert_eq!(model.report.skipped().count(), 2);
    let (_, err) = model.report.rejected().next().unwrap();
    assert!(matches!(err, RowError::ExcludedBusReference { .. }));
    assert_eq!(
        model.report.row(Table::Sources, "old_plant").unwrap().outcome,
        RowOutcome::Skipped
    );
}

#[test]
fn bad_reduction_settings_abort() {
    let mut spec = hourly_spec("cfg", 24);
    spec.settings.reduction.strategy = "typical_days".into();
    assert!(matches!(
        compile(&spec),
        Err(CompileError::Configuration(_))
    ));

    spec.settings.reduction.strategy = "sampling".into();
    spec.settings.reduction.sampling_factor = Some(0.5);
    assert!(matches!(
        compile(&spec),
        Err(CompileError::Configuration(_))
    ));
}

#[test]
fn huge_period_count_aborts_as_configuration() {
    let mut spec = hourly_spec("forever", usize::MAX);
    spec.buses.push(BusDef::new("el"));
    let err = compile(&spec).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Configuration(TsError::InvalidParameter { what: "periods", .. })
    ));
}

#[test]
fn irregular_index_aborts_reduction() {
    let t = |h: u32| {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    };
    let mut spec = ModelSpec::new("irregular");
    spec.settings.time_index = TimeIndexDef::Explicit {
        timestamps: vec![t(0), t(1), t(4), t(5), t(10)],
    };
    spec.settings.reduction.strategy = "averaging".into();
    spec.settings.reduction.block_hours = Some(2);
    assert!(matches!(compile(&spec), Err(CompileError::Data(_))));
}

#[test]
fn sequential_and_parallel_agree() {
    let mut spec = hourly_spec("many", 4);
    spec.buses.push(BusDef::new("el"));
    for i in 0..64 {
        let bus = if i % 7 == 0 { "missing" } else { "el" };
        let mut sink = EndpointDef::new(format!("load{i}"), bus);
        sink.profile_column = Some("demand".into());
        spec.sinks.push(sink);
    }
    spec.timeseries.insert("demand", vec![1.0, 2.0, 3.0, 4.0]);

    let parallel = compile(&spec).unwrap();
    spec.settings.options.parallel_validation = false;
    let sequential = compile(&spec).unwrap();

    assert_eq!(parallel.report, sequential.report);
    assert_eq!(parallel.graph.nodes(), sequential.graph.nodes());
    assert_eq!(parallel.graph.flows(), sequential.graph.flows());
    assert_eq!(parallel.report.rejected().count(), 10);
}

#[test]
fn demo_model_compiles() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/models/district_heat.yaml");
    let spec = ef_spec::load_yaml(&path).unwrap();
    let model = compile(&spec).unwrap();

    assert!(model.report.is_clean(), "{}", model.report);
    assert_eq!(model.report.reduction.original_len, 24);
    assert_eq!(model.report.reduction.reduced_len, 6);
    assert_eq!(model.time_index.len(), 6);
    assert_eq!(model.graph.horizon(), 6);
    assert_eq!(model.report.skipped().count(), 2);
    assert_eq!(model.graph.nodes().len(), 10);
    assert_eq!(model.graph.flows().len(), 10);

    let demand = model.graph.find(NodeKind::Sink, "el_demand").unwrap();
    let flow = model.graph.inputs(demand.id).next().unwrap();
    match flow.capacity {
        Some(CapacityMode::Fixed(c)) => assert!((c - 7.425 * 1.2).abs() < 1e-9),
        other => panic!("unexpected capacity {other:?}"),
    }

    let pv = model.graph.find(NodeKind::Source, "pv").unwrap();
    let pv_flow = model.graph.outputs(pv.id).next().unwrap();
    match &pv_flow.profile {
        Some(FlowProfile::Max(values)) => {
            assert_eq!(values.len(), 6);
            assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(values.iter().any(|v| *v == 1.0));
        }
        other => panic!("unexpected profile {other:?}"),
    }

    let hp = model.graph.find(NodeKind::Converter, "heat_pump").unwrap();
    let out = model.graph.outputs(hp.id).next().unwrap();
    assert!(matches!(
        hp.conversion_factor(out.id),
        Some(ConversionFactor::Series(v)) if v.len() == 6
    ));
    assert_eq!(model.graph.investment_flows().count(), 2);

    let chp = model.graph.find(NodeKind::Converter, "chp").unwrap();
    let chp_el = model.graph.outputs(chp.id).next().unwrap();
    assert_eq!(chp_el.limits, Some(FlowLimits { min: 0.4, max: 1.0 }));
    assert!(chp_el.nonconvex.is_some_and(|nc| nc.initial_status && nc.minimum_uptime == 2));
}

#[test]
fn report_serializes_to_json() {
    let mut spec = hourly_spec("json", 1);
    spec.sinks.push(EndpointDef::new("load", "nowhere"));
    let model = compile(&spec).unwrap();
    let json = serde_json::to_value(&model.report).unwrap();
    assert_eq!(json["rows"][0]["outcome"]["status"], "rejected");
    assert_eq!(
        json["rows"][0]["outcome"]["reason"]["kind"],
        "unknown_bus_reference"
    );
    assert_eq!(json["reduction"]["strategy"], "full");
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sink_capacity_covers_peak_demand(
            demand in proptest::collection::vec(0.0f64..1e4, 1..48),
            buffer in 1.0f64..2.0,
        ) {
            let mut spec = hourly_spec("prop", demand.len());
            spec.settings.options.sink_capacity_buffer = buffer;
            spec.buses.push(BusDef::new("el"));
            let mut load = EndpointDef::new("load", "el");
            load.profile_column = Some("demand".into());
            spec.sinks.push(load);
            spec.timeseries.insert("demand", demand.clone());

            let model = compile(&spec).unwrap();
            let sink = model.graph.find(NodeKind::Sink, "load").unwrap();
            let flow = model.graph.inputs(sink.id).next().unwrap();
            let peak = demand.iter().cloned().fold(0.0, f64::max);
            match flow.capacity {
                Some(CapacityMode::Fixed(c)) => prop_assert!((c - peak * buffer).abs() <= 1e-9 * (1.0 + c)),
                other => prop_assert!(false, "unexpected capacity {:?}", other),
            }
            prop_assert_eq!(flow.profile.as_ref().map(|p| p.values().to_vec()), Some(demand));
        }
    }
}
