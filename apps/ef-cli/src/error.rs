//! Error type for the command line front end.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Model error: {0}")]
    Model(#[from] ef_spec::SpecError),

    #[error("Compilation failed: {0}")]
    Compile(#[from] ef_compile::CompileError),

    #[error("Reduction failed: {0}")]
    Reduction(#[from] ef_ts::TsError),

    #[error("Invalid input: {0}")]
    Economics(#[from] ef_core::EfError),

    #[error("{count} row(s) rejected")]
    RejectedRows { count: usize },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
