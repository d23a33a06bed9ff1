//! Per-row build report.
//!
//! Every row of every table ends up in exactly one state: materialized,
//! skipped (`include = false`) or rejected with a reason. Fallback values
//! the compiler filled in and sanitized samples are attached to the row.

use ef_core::Real;
use ef_ts::ReductionStats;
use serde::Serialize;

use crate::error::RowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Buses,
    Sources,
    Sinks,
    Converters,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Table::Buses => "buses",
            Table::Sources => "sources",
            Table::Sinks => "sinks",
            Table::Converters => "converters",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RowOutcome {
    Materialized,
    Skipped,
    Rejected(RowError),
}

/// A field the compiler filled in because the row left it empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultedField {
    pub field: &'static str,
    pub value: Real,
}

/// Side information gathered while validating one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowNotes {
    pub defaulted: Vec<DefaultedField>,
    pub warnings: Vec<String>,
}

impl RowNotes {
    pub fn defaulted(&mut self, field: &'static str, value: Real) {
        self.defaulted.push(DefaultedField { field, value });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowReport {
    pub table: Table,
    /// 0-based position in the table.
    pub row: usize,
    pub label: String,
    pub outcome: RowOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<DefaultedField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub model: String,
    pub reduction: ReductionStats,
    pub rows: Vec<RowReport>,
}

impl BuildReport {
    pub fn new(model: impl Into<String>, reduction: ReductionStats) -> Self {
        Self {
            model: model.into(),
            reduction,
            rows: Vec::new(),
        }
    }

    pub(crate) fn push(
        &mut self,
        table: Table,
        row: usize,
        label: &str,
        outcome: RowOutcome,
        notes: RowNotes,
    ) {
        self.rows.push(RowReport {
            table,
            row,
            label: label.to_string(),
            outcome,
            defaulted: notes.defaulted,
            warnings: notes.warnings,
        });
    }

    pub fn materialized(&self) -> impl Iterator<Item = &RowReport> {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Materialized))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &RowReport> {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Skipped))
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&RowReport, &RowError)> {
        self.rows.iter().filter_map(|r| match &r.outcome {
            RowOutcome::Rejected(err) => Some((r, err)),
            _ => None,
        })
    }

    /// Look up the report of a row by table and label (first match).
    pub fn row(&self, table: Table, label: &str) -> Option<&RowReport> {
        self.rows
            .iter()
            .find(|r| r.table == table && r.label == label)
    }

    /// True when no row was rejected.
    pub fn is_clean(&self) -> bool {
        self.rejected().next().is_none()
    }
}

impl std::fmt::Display for BuildReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{}: {} materialized, {} skipped, {} rejected",
            self.model,
            self.materialized().count(),
            self.skipped().count(),
            self.rejected().count()
        )?;
        writeln!(
            f,
            "  time steps: {} -> {} ({})",
            self.reduction.original_len, self.reduction.reduced_len, self.reduction.strategy
        )?;
        for (row, err) in self.rejected() {
            writeln!(f, "  rejected {} '{}': {}", row.table, row.label, err)?;
        }
        Ok(())
    }
}
