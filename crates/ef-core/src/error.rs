use thiserror::Error;

pub type EfResult<T> = Result<T, EfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid parameter {what} = {value}: {reason}")]
    InvalidParameter {
        what: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}
