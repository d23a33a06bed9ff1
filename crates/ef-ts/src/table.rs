//! Named numeric columns aligned with a time index.

use std::collections::BTreeMap;

use ef_core::Real;
use serde::{Deserialize, Serialize};

/// Profile keyword -> samples. Column order is the sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesTable {
    columns: BTreeMap<String, Vec<Real>>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Real>) {
        self.columns.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[Real]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Real])> {
        self.columns
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// New table with `f` applied to every column.
    pub fn map_columns<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&[Real]) -> Vec<Real>,
    {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), f(v)))
                .collect(),
        }
    }

    /// Split into columns of exactly `len` samples and the lengths of all
    /// other columns.
    pub fn split_by_len(&self, len: usize) -> (SeriesTable, BTreeMap<String, usize>) {
        let mut aligned = SeriesTable::new();
        let mut misaligned = BTreeMap::new();
        for (name, values) in &self.columns {
            if values.len() == len {
                aligned.columns.insert(name.clone(), values.clone());
            } else {
                misaligned.insert(name.clone(), values.len());
            }
        }
        (aligned, misaligned)
    }
}

impl FromIterator<(String, Vec<Real>)> for SeriesTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Real>)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
