//! Model document schema.
//!
//! One document holds the normalized tables of a model: buses, sources,
//! sinks, converters, named time series and the compile settings.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use ef_ts::{ReductionSettings, SeriesTable, TimeIndex, TsResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub settings: SettingsDef,
    #[serde(default)]
    pub buses: Vec<BusDef>,
    #[serde(default)]
    pub sources: Vec<EndpointDef>,
    #[serde(default)]
    pub sinks: Vec<EndpointDef>,
    #[serde(default)]
    pub converters: Vec<ConverterDef>,
    #[serde(default)]
    pub timeseries: SeriesTable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsDef {
    #[serde(default)]
    pub time_index: TimeIndexDef,
    #[serde(default)]
    pub reduction: ReductionSettings,
    #[serde(default)]
    pub options: CompileOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TimeIndexDef {
    Regular {
        start: NaiveDateTime,
        periods: usize,
        #[serde(default = "default_freq_minutes")]
        freq_minutes: u32,
    },
    Explicit {
        timestamps: Vec<NaiveDateTime>,
    },
}

impl Default for TimeIndexDef {
    fn default() -> Self {
        TimeIndexDef::Regular {
            start: NaiveDate::from_ymd_opt(2025, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            periods: 8760,
            freq_minutes: default_freq_minutes(),
        }
    }
}

impl TimeIndexDef {
    pub fn build(&self) -> TsResult<TimeIndex> {
        match self {
            TimeIndexDef::Regular {
                start,
                periods,
                freq_minutes,
            } => TimeIndex::regular(
                *start,
                *periods,
                TimeDelta::minutes(i64::from(*freq_minutes)),
            ),
            TimeIndexDef::Explicit { timestamps } => TimeIndex::new(timestamps.clone()),
        }
    }
}

fn default_freq_minutes() -> u32 {
    60
}

/// Knobs of the compiler that are not part of any table row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompileOptions {
    /// Upper investment bound used when a row leaves `invest_max` empty.
    #[serde(default = "default_invest_max_fallback")]
    pub invest_max_fallback: f64,
    /// Multiplier on peak demand for sinks without an explicit capacity.
    #[serde(default = "default_sink_capacity_buffer")]
    pub sink_capacity_buffer: f64,
    /// Separator of converter bus lists.
    #[serde(default = "default_list_delimiter")]
    pub list_delimiter: char,
    /// Separator of converter conversion-factor lists.
    #[serde(default = "default_factor_delimiter")]
    pub factor_delimiter: char,
    #[serde(default = "default_parallel_validation")]
    pub parallel_validation: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            invest_max_fallback: default_invest_max_fallback(),
            sink_capacity_buffer: default_sink_capacity_buffer(),
            list_delimiter: default_list_delimiter(),
            factor_delimiter: default_factor_delimiter(),
            parallel_validation: default_parallel_validation(),
        }
    }
}

fn default_invest_max_fallback() -> f64 {
    500.0
}

fn default_sink_capacity_buffer() -> f64 {
    1.2
}

fn default_list_delimiter() -> char {
    '|'
}

fn default_factor_delimiter() -> char {
    ';'
}

fn default_parallel_validation() -> bool {
    true
}

fn default_include() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusDef {
    pub label: String,
    #[serde(default = "default_include")]
    pub include: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Capacity columns shared by sources, sinks and converters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CapacityDef {
    #[serde(default)]
    pub investment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invest_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invest_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_costs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
}

/// Per-unit `min`/`max` of the unit's main flow, relative to its capacity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlowLimitsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FlowLimitsDef {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// On/off operation columns. Step counts are whole numbers;
/// `initial_status` is 0 (off) or 1 (on).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NonConvexDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_uptime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_downtime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_costs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown_costs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_startups: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_shutdowns: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_status: Option<f64>,
}

impl NonConvexDef {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A source or sink row: a single flow between the unit and one bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointDef {
    pub label: String,
    #[serde(default = "default_include")]
    pub include: bool,
    pub bus: String,
    #[serde(flatten)]
    pub capacity: CapacityDef,
    #[serde(flatten)]
    pub limits: FlowLimitsDef,
    #[serde(flatten)]
    pub nonconvex: NonConvexDef,
    #[serde(default)]
    pub variable_costs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConverterDef {
    pub label: String,
    #[serde(default = "default_include")]
    pub include: bool,
    /// Delimiter-joined, ordered input bus labels.
    pub input_bus: String,
    /// Delimiter-joined, ordered output bus labels.
    pub output_bus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_conversion_factors: Option<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_conversion_factors: Option<Cell>,
    /// Legacy single factor, applied to the output side when no output
    /// list is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
    /// Capacity, cost and operating columns apply to the first output.
    #[serde(flatten)]
    pub capacity: CapacityDef,
    #[serde(flatten)]
    pub limits: FlowLimitsDef,
    #[serde(flatten)]
    pub nonconvex: NonConvexDef,
    #[serde(default)]
    pub variable_costs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A table cell that may hold a number or text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn to_text(&self) -> String {
        match self {
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl ModelSpec {
    /// Empty document at the latest version.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: crate::LATEST_VERSION,
            name: name.into(),
            settings: SettingsDef::default(),
            buses: Vec::new(),
            sources: Vec::new(),
            sinks: Vec::new(),
            converters: Vec::new(),
            timeseries: SeriesTable::new(),
        }
    }
}

impl BusDef {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            include: true,
            description: None,
        }
    }
}

impl EndpointDef {
    pub fn new(label: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            include: true,
            bus: bus.into(),
            capacity: CapacityDef::default(),
            limits: FlowLimitsDef::default(),
            nonconvex: NonConvexDef::default(),
            variable_costs: 0.0,
            profile_column: None,
            description: None,
        }
    }
}

impl ConverterDef {
    pub fn new(
        label: impl Into<String>,
        input_bus: impl Into<String>,
        output_bus: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            include: true,
            input_bus: input_bus.into(),
            output_bus: output_bus.into(),
            input_conversion_factors: None,
            output_conversion_factors: None,
            conversion_factor: None,
            capacity: CapacityDef::default(),
            limits: FlowLimitsDef::default(),
            nonconvex: NonConvexDef::default(),
            variable_costs: 0.0,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document_takes_defaults() {
        let spec: ModelSpec = serde_yaml::from_str(
            "version: 1\nname: tiny\nbuses:\n  - label: el\n",
        )
        .unwrap();
        assert!(spec.buses[0].include);
        assert_eq!(spec.settings.options, CompileOptions::default());
        assert_eq!(spec.settings.time_index, TimeIndexDef::default());
        assert_eq!(spec.settings.time_index.build().unwrap().len(), 8760);
    }

    #[test]
    fn capacity_columns_are_flat() {
        let yaml = r#"
label: pv
bus: el
investment: true
invest_max: 40
investment_costs: 800.0
lifetime: 25
interest_rate: 0.05
profile_column: pv_profile
"#;
        let row: EndpointDef = serde_yaml::from_str(yaml).unwrap();
        assert!(row.capacity.investment);
        assert_eq!(row.capacity.invest_max, Some(40.0));
        assert_eq!(row.capacity.lifetime, Some(25.0));
        assert_eq!(row.profile_column.as_deref(), Some("pv_profile"));
    }

    #[test]
    fn operating_columns_are_flat() {
        let yaml = r#"
label: chp
input_bus: gas
output_bus: el|heat
nominal_capacity: 20
min: 0.4
minimum_uptime: 3
startup_costs: 150
initial_status: 1
"#;
        let row: ConverterDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(row.limits.min, Some(0.4));
        assert_eq!(row.limits.max, None);
        assert_eq!(row.nonconvex.minimum_uptime, Some(3.0));
        assert_eq!(row.nonconvex.startup_costs, Some(150.0));
        assert_eq!(row.nonconvex.initial_status, Some(1.0));
        assert!(!row.nonconvex.is_empty());
        assert!(EndpointDef::new("grid", "el").nonconvex.is_empty());
    }

    #[test]
    fn factor_cells_accept_numbers_and_text() {
        let yaml = r#"
label: chp
input_bus: gas
output_bus: el|heat
input_conversion_factors: 1
output_conversion_factors: "0,35;0.5"
"#;
        let row: ConverterDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(row.input_conversion_factors, Some(Cell::Number(1.0)));
        assert_eq!(
            row.output_conversion_factors.as_ref().map(Cell::to_text),
            Some("0,35;0.5".to_string())
        );
    }

    #[test]
    fn explicit_time_index() {
        let yaml = r#"
type: Explicit
timestamps: ["2025-01-01T00:00:00", "2025-01-01T01:00:00"]
"#;
        let def: TimeIndexDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.build().unwrap().len(), 2);
    }
}
