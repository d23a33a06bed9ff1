//! ef-core: stable foundation for enerflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for graph objects)
//! - economics (annuity / equivalent periodic cost)
//! - error (shared error types)

pub mod economics;
pub mod error;
pub mod ids;
pub mod numeric;

pub use economics::{annualized_cost, annuity_factor};
pub use error::{EfError, EfResult};
pub use ids::*;
pub use numeric::*;
