//! ef-ts: time index, named series and temporal resolution reduction.
//!
//! A model's time-varying inputs are a [`TimeIndex`] plus a [`SeriesTable`]
//! of equally long numeric columns. [`reduce`] derives a smaller pair from
//! them according to a [`ReductionStrategy`]; the inputs are never mutated.
//!
//! # Example
//!
//! ```
//! use chrono::{NaiveDate, TimeDelta};
//! use ef_ts::{ReductionStrategy, SeriesTable, TimeIndex, reduce};
//!
//! let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let index = TimeIndex::regular(start, 4, TimeDelta::hours(1)).unwrap();
//! let mut table = SeriesTable::new();
//! table.insert("demand", vec![1.0, 2.0, 3.0, 4.0]);
//!
//! let out = reduce(&index, &table, &ReductionStrategy::BlockAverage { block_len: 2 }).unwrap();
//! assert_eq!(out.table.get("demand").unwrap(), &[1.5, 3.5]);
//! assert_eq!(out.stats.reduced_len, 2);
//! ```

pub mod error;
pub mod index;
pub mod reduce;
pub mod settings;
pub mod table;

pub use error::{TsError, TsResult};
pub use index::{MAX_PERIODS, REGULARITY_THRESHOLD, TimeIndex};
pub use reduce::{Reduction, ReductionStats, ReductionStrategy, reduce};
pub use settings::{ReductionSettings, STANDARD_BLOCK_HOURS};
pub use table::SeriesTable;
