//! Error types for the compiler.

use ef_core::EfError;
use ef_graph::GraphError;
use ef_spec::ValidationError;
use ef_ts::TsError;
use serde::Serialize;

/// Which side of a converter a list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Input,
    Output,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Side::Input => "input",
            Side::Output => "output",
        })
    }
}

/// Broad category of a row rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The row is inconsistent with the rest of the model.
    Validation,
    /// A numeric parameter is out of its domain.
    Parameter,
    /// Time-series data doesn't fit the row.
    Data,
}

/// Reason a single row was rejected. The compile carries on without it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("unknown bus '{bus}'")]
    UnknownBusReference { bus: String },

    #[error("bus '{bus}' is excluded")]
    ExcludedBusReference { bus: String },

    #[error("{side} bus list is empty")]
    EmptyBusList { side: Side },

    #[error("{side} side has {buses} buses but {factors} conversion factors")]
    ArityMismatch {
        side: Side,
        buses: usize,
        factors: usize,
    },

    #[error("profile has {actual} values, time index has {expected}")]
    ProfileLengthMismatch { expected: usize, actual: usize },

    #[error("profile '{keyword}' not found in time series")]
    UnknownProfileKeyword { keyword: String },

    #[error("invalid {what} = {value}: {reason}")]
    InvalidParameter {
        what: String,
        value: String,
        reason: String,
    },

    #[error("profile '{keyword}' needs a capacity (set nominal_capacity or investment)")]
    MissingCapacity { keyword: String },

    #[error("{field} needs a capacity (set nominal_capacity or investment)")]
    CapacityRequired { field: String },

    #[error("duplicate label '{label}'")]
    DuplicateLabel { label: String },

    #[error("label is empty")]
    EmptyLabel,
}

impl RowError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RowError::UnknownBusReference { .. }
            | RowError::ExcludedBusReference { .. }
            | RowError::EmptyBusList { .. }
            | RowError::ArityMismatch { .. }
            | RowError::DuplicateLabel { .. }
            | RowError::EmptyLabel => ErrorClass::Validation,
            RowError::InvalidParameter { .. }
            | RowError::MissingCapacity { .. }
            | RowError::CapacityRequired { .. } => ErrorClass::Parameter,
            RowError::ProfileLengthMismatch { .. } | RowError::UnknownProfileKeyword { .. } => {
                ErrorClass::Data
            }
        }
    }

    pub(crate) fn invalid(what: &str, value: impl std::fmt::Display, reason: &str) -> Self {
        RowError::InvalidParameter {
            what: what.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<EfError> for RowError {
    fn from(err: EfError) -> Self {
        match err {
            EfError::InvalidParameter {
                what,
                value,
                reason,
            } => RowError::invalid(what, value, reason),
            EfError::NonFinite { what, value } => RowError::invalid(what, value, "must be finite"),
            other => RowError::invalid("value", other, "rejected"),
        }
    }
}

/// Errors that abort the whole compile.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("Model document invalid: {0}")]
    Spec(#[from] ValidationError),

    #[error("Reduction settings invalid: {0}")]
    Configuration(TsError),

    #[error("Time series data unusable: {0}")]
    Data(TsError),

    #[error("Graph invariant violated: {0}")]
    Graph(#[from] GraphError),
}

impl From<TsError> for CompileError {
    fn from(err: TsError) -> Self {
        if err.is_configuration() {
            CompileError::Configuration(err)
        } else {
            CompileError::Data(err)
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
