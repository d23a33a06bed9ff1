//! Stable indexing for solver integration.
//!
//! Provides bidirectional mappings between domain IDs (NodeId, FlowId)
//! and contiguous solver indices (0..N).

use ef_core::{FlowId, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;

/// Index map providing stable, contiguous indices for graph objects.
///
/// Solvers lay out one variable column per flow and time step; this map
/// gives O(1) lookup between IDs and those positions.
#[derive(Debug, Clone)]
pub struct IndexMap {
    node_ids: Vec<NodeId>,
    flow_ids: Vec<FlowId>,
    /// Sized to max(NodeId.index) + 1; None if that ID doesn't exist.
    node_to_idx: Vec<Option<usize>>,
    flow_to_idx: Vec<Option<usize>>,
}

impl IndexMap {
    pub fn from_graph(graph: &Graph) -> Self {
        let node_ids: Vec<NodeId> = graph.nodes().iter().map(|n| n.id).collect();
        let flow_ids: Vec<FlowId> = graph.flows().iter().map(|f| f.id).collect();
        Self {
            node_to_idx: reverse(&node_ids),
            flow_to_idx: reverse(&flow_ids),
            node_ids,
            flow_ids,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn flow_count(&self) -> usize {
        self.flow_ids.len()
    }

    pub fn node_idx(&self, id: NodeId) -> GraphResult<usize> {
        self.node_to_idx
            .get(id.as_usize())
            .and_then(|&opt| opt)
            .ok_or(GraphError::IdNotFound { what: "NodeId" })
    }

    pub fn flow_idx(&self, id: FlowId) -> GraphResult<usize> {
        self.flow_to_idx
            .get(id.as_usize())
            .and_then(|&opt| opt)
            .ok_or(GraphError::IdNotFound { what: "FlowId" })
    }

    /// Node ID for a contiguous index (panics if out of bounds).
    pub fn node_id(&self, i: usize) -> NodeId {
        self.node_ids[i]
    }

    /// Flow ID for a contiguous index (panics if out of bounds).
    pub fn flow_id(&self, i: usize) -> FlowId {
        self.flow_ids[i]
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    pub fn flow_ids(&self) -> &[FlowId] {
        &self.flow_ids
    }
}

fn reverse<K>(ids: &[ef_core::Id<K>]) -> Vec<Option<usize>> {
    let len = ids.iter().map(|id| id.as_usize() + 1).max().unwrap_or(0);
    let mut out = vec![None; len];
    for (i, id) in ids.iter().enumerate() {
        out[id.as_usize()] = Some(i);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FlowAttrs, GraphBuilder};
    use crate::graph::{CapacityMode, NodeKind};

    fn small_graph() -> (Graph, Vec<NodeId>, FlowId) {
        let mut builder = GraphBuilder::new(1);
        let el = builder.add_node("el", NodeKind::Bus);
        let grid = builder.add_node("grid", NodeKind::Source);
        let load = builder.add_node("load", NodeKind::Sink);
        let f = builder.add_flow(
            grid,
            el,
            FlowAttrs {
                capacity: Some(CapacityMode::Fixed(10.0)),
                ..Default::default()
            },
        );
        builder.add_flow(el, load, FlowAttrs::default());
        (builder.build().unwrap(), vec![el, grid, load], f)
    }

    #[test]
    fn index_map_round_trip() {
        let (graph, nodes, f) = small_graph();
        let idx = IndexMap::from_graph(&graph);
        assert_eq!(idx.node_count(), 3);
        assert_eq!(idx.flow_count(), 2);
        for (i, n) in nodes.iter().enumerate() {
            assert_eq!(idx.node_idx(*n).unwrap(), i);
            assert_eq!(idx.node_id(i), *n);
        }
        assert_eq!(idx.flow_id(idx.flow_idx(f).unwrap()), f);
    }

    #[test]
    fn index_map_invalid_id() {
        let (graph, _, _) = small_graph();
        let idx = IndexMap::from_graph(&graph);
        assert_eq!(
            idx.node_idx(NodeId::from_index(999)),
            Err(GraphError::IdNotFound { what: "NodeId" })
        );
        assert!(idx.flow_idx(FlowId::from_index(5)).is_err());
    }
}
