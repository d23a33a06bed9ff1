//! Temporal resolution reduction.
//!
//! Every strategy maps the full index onto a subset of positions (or
//! blocks of positions) and transforms each column with the same
//! positions. Only columns exactly as long as the index are transformed.
//! Any other column is left out of the reduced table and listed in
//! [`Reduction::misaligned`] with its original length.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use ef_core::{Real, mean};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{TsError, TsResult};
use crate::index::{REGULARITY_THRESHOLD, TimeIndex};
use crate::table::SeriesTable;

/// How the time index is shrunk. Exactly one applies per compile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReductionStrategy {
    /// Identity.
    Full,
    /// Mean over contiguous blocks of `block_len` samples, stamped with the
    /// block start. A trailing partial block is dropped.
    BlockAverage { block_len: usize },
    /// Samples with `start <= t <= end`.
    Range {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Every `round(factor)`-th sample starting at the first.
    PeriodicSampling { factor: Real },
}

impl ReductionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ReductionStrategy::Full => "full",
            ReductionStrategy::BlockAverage { .. } => "block_average",
            ReductionStrategy::Range { .. } => "time_range",
            ReductionStrategy::PeriodicSampling { .. } => "sampling",
        }
    }

    /// Parameter checks that need no data.
    pub fn validate(&self) -> TsResult<()> {
        match *self {
            ReductionStrategy::Full | ReductionStrategy::Range { .. } => Ok(()),
            ReductionStrategy::BlockAverage { block_len } => {
                if block_len == 0 {
                    return Err(TsError::InvalidParameter {
                        what: "block_hours",
                        value: "0".into(),
                    });
                }
                Ok(())
            }
            ReductionStrategy::PeriodicSampling { factor } => sampling_step(factor).map(|_| ()),
        }
    }
}

/// Summary of one reduction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReductionStats {
    pub strategy: &'static str,
    pub original_len: usize,
    pub reduced_len: usize,
    /// `reduced_len / original_len`.
    pub ratio: Real,
}

/// Derived index and table. The inputs are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub index: TimeIndex,
    /// Reduced columns; all of them span `index`.
    pub table: SeriesTable,
    /// Columns whose length differed from the full index, with that length.
    pub misaligned: BTreeMap<String, usize>,
    pub stats: ReductionStats,
}

/// Apply `strategy` to `index` and every column of `table`.
pub fn reduce(
    index: &TimeIndex,
    table: &SeriesTable,
    strategy: &ReductionStrategy,
) -> TsResult<Reduction> {
    strategy.validate()?;
    if !matches!(strategy, ReductionStrategy::Full) {
        index.ensure_regular(REGULARITY_THRESHOLD)?;
    }

    let (aligned, misaligned) = table.split_by_len(index.len());
    for (column, len) in &misaligned {
        warn!(
            column = column.as_str(),
            len,
            expected = index.len(),
            "series length differs from time index, column set aside"
        );
    }

    let (new_index, new_table) = match *strategy {
        ReductionStrategy::Full => (index.clone(), aligned),
        ReductionStrategy::BlockAverage { block_len } => block_average(index, &aligned, block_len)?,
        ReductionStrategy::Range { start, end } => {
            let positions: Vec<usize> = index
                .stamps()
                .iter()
                .enumerate()
                .filter(|(_, t)| **t >= start && **t <= end)
                .map(|(i, _)| i)
                .collect();
            if positions.is_empty() {
                return Err(TsError::EmptyRange { start, end });
            }
            select(index, &aligned, &positions)
        }
        ReductionStrategy::PeriodicSampling { factor } => {
            let step = sampling_step(factor)?;
            let positions: Vec<usize> = (0..index.len()).step_by(step).collect();
            select(index, &aligned, &positions)
        }
    };

    let stats = ReductionStats {
        strategy: strategy.name(),
        original_len: index.len(),
        reduced_len: new_index.len(),
        ratio: new_index.len() as Real / index.len() as Real,
    };
    info!(
        strategy = stats.strategy,
        original = stats.original_len,
        reduced = stats.reduced_len,
        ratio = stats.ratio,
        "temporal reduction applied"
    );

    Ok(Reduction {
        index: new_index,
        table: new_table,
        misaligned,
        stats,
    })
}

fn sampling_step(factor: Real) -> TsResult<usize> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(TsError::InvalidParameter {
            what: "sampling_factor",
            value: factor.to_string(),
        });
    }
    if factor < 1.0 {
        return Err(TsError::UnsupportedSamplingFactor { factor });
    }
    Ok(factor.round() as usize)
}

fn select(index: &TimeIndex, table: &SeriesTable, positions: &[usize]) -> (TimeIndex, SeriesTable) {
    let new_table = table.map_columns(|col| {
        positions
            .iter()
            .filter_map(|&p| col.get(p).copied())
            .collect()
    });
    (index.select(positions), new_table)
}

fn block_average(
    index: &TimeIndex,
    table: &SeriesTable,
    block_len: usize,
) -> TsResult<(TimeIndex, SeriesTable)> {
    let blocks = index.len() / block_len;
    if blocks == 0 {
        return Err(TsError::NothingRetained {
            len: index.len(),
            block_len,
        });
    }
    let starts: Vec<usize> = (0..blocks).map(|b| b * block_len).collect();
    let new_table = table.map_columns(|col| {
        col.chunks_exact(block_len)
            .take(blocks)
            .filter_map(mean)
            .collect()
    });
    Ok((index.select(&starts), new_table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn hourly(n: usize) -> TimeIndex {
        let t0 = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TimeIndex::regular(t0, n, TimeDelta::hours(1)).unwrap()
    }

    fn table(name: &str, values: Vec<Real>) -> SeriesTable {
        let mut t = SeriesTable::new();
        t.insert(name, values);
        t
    }

    #[test]
    fn block_average_of_constant_series() {
        let idx = hourly(24);
        let tbl = table("c", vec![3.25; 24]);
        let out = reduce(&idx, &tbl, &ReductionStrategy::BlockAverage { block_len: 6 }).unwrap();
        assert_eq!(out.index.len(), 4);
        assert_eq!(out.table.get("c").unwrap(), &[3.25; 4]);
        assert_eq!(out.index.stamps()[1], idx.stamps()[6]);
        assert_eq!(out.stats.ratio, 4.0 / 24.0);
    }

    #[test]
    fn block_average_means() {
        let idx = hourly(4);
        let tbl = table("x", vec![1.0, 2.0, 3.0, 4.0]);
        let out = reduce(&idx, &tbl, &ReductionStrategy::BlockAverage { block_len: 2 }).unwrap();
        assert_eq!(out.table.get("x").unwrap(), &[1.5, 3.5]);
    }

    #[test]
    fn block_average_drops_partial_block() {
        let idx = hourly(7);
        let tbl = table("x", (0..7).map(|v| v as Real).collect());
        let out = reduce(&idx, &tbl, &ReductionStrategy::BlockAverage { block_len: 3 }).unwrap();
        assert_eq!(out.index.len(), 2);
        assert_eq!(out.table.get("x").unwrap(), &[1.0, 4.0]);
    }

    #[test]
    fn block_longer_than_index_retains_nothing() {
        let err = reduce(
            &hourly(3),
            &SeriesTable::new(),
            &ReductionStrategy::BlockAverage { block_len: 4 },
        )
        .unwrap_err();
        assert_eq!(err, TsError::NothingRetained { len: 3, block_len: 4 });
    }

    #[test]
    fn zero_block_is_configuration_error() {
        let err = reduce(
            &hourly(3),
            &SeriesTable::new(),
            &ReductionStrategy::BlockAverage { block_len: 0 },
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn range_is_inclusive() {
        let idx = hourly(10);
        let tbl = table("x", (0..10).map(|v| v as Real).collect());
        let start = idx.stamps()[2];
        let end = idx.stamps()[5];
        let out = reduce(&idx, &tbl, &ReductionStrategy::Range { start, end }).unwrap();
        assert_eq!(out.table.get("x").unwrap(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(out.index.first(), start);
        assert_eq!(out.index.last(), end);
    }

    #[test]
    fn empty_range_is_data_error() {
        let idx = hourly(10);
        let start = idx.last() + TimeDelta::hours(1);
        let end = start + TimeDelta::hours(5);
        let err = reduce(&idx, &SeriesTable::new(), &ReductionStrategy::Range { start, end })
            .unwrap_err();
        assert!(matches!(err, TsError::EmptyRange { .. }));
        assert!(!err.is_configuration());
    }

    #[test]
    fn sampling_rounds_the_factor() {
        let idx = hourly(10);
        let tbl = table("x", (0..10).map(|v| v as Real).collect());
        let out = reduce(
            &idx,
            &tbl,
            &ReductionStrategy::PeriodicSampling { factor: 3.4 },
        )
        .unwrap();
        assert_eq!(out.table.get("x").unwrap(), &[0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn sampling_below_one_is_unsupported() {
        let err = reduce(
            &hourly(10),
            &SeriesTable::new(),
            &ReductionStrategy::PeriodicSampling { factor: 0.5 },
        )
        .unwrap_err();
        assert_eq!(err, TsError::UnsupportedSamplingFactor { factor: 0.5 });
        for bad in [0.0, -2.0, Real::NAN] {
            assert!(matches!(
                ReductionStrategy::PeriodicSampling { factor: bad }.validate(),
                Err(TsError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn irregular_index_rejected_except_for_full() {
        let t = hourly(1).first();
        let idx = TimeIndex::new(vec![
            t,
            t + TimeDelta::hours(1),
            t + TimeDelta::hours(4),
            t + TimeDelta::hours(5),
            t + TimeDelta::hours(10),
        ])
        .unwrap();
        let tbl = SeriesTable::new();
        assert!(reduce(&idx, &tbl, &ReductionStrategy::Full).is_ok());
        assert!(matches!(
            reduce(&idx, &tbl, &ReductionStrategy::PeriodicSampling { factor: 2.0 }),
            Err(TsError::IndexNotRegular { .. })
        ));
    }

    #[test]
    fn short_column_is_set_aside_under_sampling() {
        let idx = hourly(8);
        // missing tail falls between sampled positions
        let mut tbl = table("short", vec![1.0; 7]);
        tbl.insert("ok", vec![2.0; 8]);
        let out = reduce(
            &idx,
            &tbl,
            &ReductionStrategy::PeriodicSampling { factor: 2.0 },
        )
        .unwrap();
        assert_eq!(out.index.len(), 4);
        assert!(out.table.get("short").is_none());
        assert_eq!(out.misaligned.get("short"), Some(&7));
        assert_eq!(out.table.get("ok").unwrap(), &[2.0; 4]);
    }

    #[test]
    fn long_column_is_set_aside_under_block_average() {
        let idx = hourly(12);
        let tbl = table("wind", vec![0.5; 15]);
        let out = reduce(&idx, &tbl, &ReductionStrategy::BlockAverage { block_len: 6 }).unwrap();
        assert!(out.table.is_empty());
        assert_eq!(out.misaligned.get("wind"), Some(&15));
    }

    #[test]
    fn full_also_sets_aside_misaligned_columns() {
        let out = reduce(&hourly(4), &table("x", vec![1.0; 3]), &ReductionStrategy::Full).unwrap();
        assert!(out.table.is_empty());
        assert_eq!(out.misaligned.get("x"), Some(&3));
    }

    #[test]
    fn inputs_are_not_mutated() {
        let idx = hourly(6);
        let tbl = table("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let before = (idx.clone(), tbl.clone());
        reduce(&idx, &tbl, &ReductionStrategy::BlockAverage { block_len: 3 }).unwrap();
        assert_eq!((idx, tbl), before);
    }
}
