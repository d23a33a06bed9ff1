//! Per-compile state shared by the row validators.

use std::collections::{BTreeMap, HashMap, HashSet};

use ef_core::NodeId;
use ef_spec::CompileOptions;
use ef_ts::SeriesTable;

use crate::error::RowError;

/// Read-only view handed to every row validator of one compile.
///
/// Nothing in here outlives the compile; validators never mutate it, so it
/// is shared freely across worker threads.
#[derive(Debug)]
pub struct CompileContext<'a> {
    pub options: &'a CompileOptions,
    /// Reduced series table.
    pub table: &'a SeriesTable,
    /// Length of the active (reduced) time index.
    pub horizon: usize,
    /// Length of the time index before reduction.
    pub full_len: usize,
    /// Columns left out of `table` because their length differs from
    /// `full_len`, with that length.
    pub misaligned: BTreeMap<String, usize>,
    buses: HashMap<String, NodeId>,
    excluded_buses: HashSet<String>,
}

impl<'a> CompileContext<'a> {
    pub fn new(options: &'a CompileOptions, table: &'a SeriesTable, horizon: usize) -> Self {
        Self {
            options,
            table,
            horizon,
            full_len: horizon,
            misaligned: BTreeMap::new(),
            buses: HashMap::new(),
            excluded_buses: HashSet::new(),
        }
    }

    /// Record the unreduced index length and the columns set aside for not
    /// matching it.
    pub fn with_misaligned(mut self, full_len: usize, misaligned: BTreeMap<String, usize>) -> Self {
        self.full_len = full_len;
        self.misaligned = misaligned;
        self
    }

    pub(crate) fn register_bus(&mut self, label: &str, id: NodeId) {
        self.buses.insert(label.to_string(), id);
    }

    pub(crate) fn register_excluded_bus(&mut self, label: &str) {
        self.excluded_buses.insert(label.to_string());
    }

    /// Included bus by label.
    pub fn bus(&self, label: &str) -> Result<NodeId, RowError> {
        let label = label.trim();
        if let Some(id) = self.buses.get(label) {
            return Ok(*id);
        }
        if self.excluded_buses.contains(label) {
            return Err(RowError::ExcludedBusReference {
                bus: label.to_string(),
            });
        }
        Err(RowError::UnknownBusReference {
            bus: label.to_string(),
        })
    }

    /// Ordered bus IDs of a delimiter-joined list.
    pub fn bus_list(&self, joined: &str) -> Result<Vec<NodeId>, RowError> {
        split_list(joined, self.options.list_delimiter)
            .map(|label| self.bus(label))
            .collect()
    }
}

/// Non-empty, trimmed tokens of a delimiter-joined cell.
pub(crate) fn split_list(joined: &str, delimiter: char) -> impl Iterator<Item = &str> {
    joined
        .split(delimiter)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
