//! ef-compile: turns a model document into a solver-ready graph.
//!
//! Pipeline per compile:
//! 1. document validation (`ef-spec`)
//! 2. temporal reduction of index and series (`ef-ts`)
//! 3. per-row validation: capacity resolution, operating limits, profile
//!    binding, bus lookup
//! 4. materialization into an immutable [`ef_graph::Graph`]
//!
//! Row problems never abort a compile; they show up in the [`BuildReport`].

pub mod capacity;
pub mod compile;
pub mod context;
pub mod error;
pub mod operation;
pub mod profile;
pub mod report;
pub mod rows;

pub use compile::{CompiledModel, compile};
pub use context::CompileContext;
pub use error::{CompileError, CompileResult, ErrorClass, RowError, Side};
pub use report::{BuildReport, DefaultedField, RowNotes, RowOutcome, RowReport, Table};
