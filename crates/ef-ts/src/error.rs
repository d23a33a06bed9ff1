//! Time-series and reduction errors.

use chrono::NaiveDateTime;
use thiserror::Error;

pub type TsResult<T> = Result<T, TsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TsError {
    #[error("Time index is empty")]
    EmptyIndex,

    #[error("Time index is not strictly increasing at position {position}")]
    NotIncreasing { position: usize },

    #[error(
        "Time index is not regular enough for reduction: {share:.2} of intervals match the modal step (need {threshold:.2})"
    )]
    IndexNotRegular { share: f64, threshold: f64 },

    #[error("No samples between {start} and {end}")]
    EmptyRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Block of {block_len} samples retains nothing from an index of {len}")]
    NothingRetained { len: usize, block_len: usize },

    #[error("Invalid reduction parameter {what} = {value}")]
    InvalidParameter { what: &'static str, value: String },

    #[error("Unknown reduction strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("Strategy '{strategy}' requires '{parameter}'")]
    MissingParameter {
        strategy: &'static str,
        parameter: &'static str,
    },

    #[error("Sampling factor {factor} < 1 is not supported")]
    UnsupportedSamplingFactor { factor: f64 },
}

impl TsError {
    /// Errors caused by the reduction settings themselves rather than by
    /// the data they are applied to.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TsError::InvalidParameter { .. }
                | TsError::UnknownStrategy { .. }
                | TsError::MissingParameter { .. }
                | TsError::UnsupportedSamplingFactor { .. }
        )
    }
}
