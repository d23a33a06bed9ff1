//! Incremental graph builder.

use std::collections::HashMap;

use ef_core::{FlowId, NodeId, Real};

use crate::error::GraphResult;
use crate::graph::{
    CapacityMode, ConversionFactor, Flow, FlowLimits, FlowProfile, Graph, Node, NodeKind,
    NonConvex,
};
use crate::validate;

/// Attributes of a flow other than its endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowAttrs {
    pub capacity: Option<CapacityMode>,
    pub variable_costs: Real,
    pub profile: Option<FlowProfile>,
    pub limits: Option<FlowLimits>,
    pub nonconvex: Option<NonConvex>,
}

/// Builder for constructing a graph incrementally.
///
/// Use `add_node` and `add_flow` to build up the graph, then call
/// `build()` to validate and freeze it into an immutable `Graph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    horizon: usize,
    nodes: Vec<Node>,
    flows: Vec<Flow>,
    next_node_id: u32,
    next_flow_id: u32,
}

impl GraphBuilder {
    /// Create an empty builder whose profiles must span `horizon` steps.
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            ..Self::default()
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Add a node and return its ID.
    pub fn add_node(&mut self, label: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.push(Node {
            id,
            label: label.into(),
            kind,
            conversion_factors: Vec::new(),
        });
        id
    }

    /// Add a directed flow from `from` to `to` and return its ID.
    pub fn add_flow(&mut self, from: NodeId, to: NodeId, attrs: FlowAttrs) -> FlowId {
        let id = FlowId::from_index(self.next_flow_id);
        self.next_flow_id += 1;
        self.flows.push(Flow {
            id,
            from,
            to,
            capacity: attrs.capacity,
            variable_costs: attrs.variable_costs,
            profile: attrs.profile,
            limits: attrs.limits,
            nonconvex: attrs.nonconvex,
        });
        id
    }

    /// Attach a conversion factor for `flow` to converter `node`.
    ///
    /// Replaces an earlier factor for the same flow. Unknown nodes are
    /// ignored; `build()` reports uncovered flows.
    pub fn set_conversion_factor(&mut self, node: NodeId, flow: FlowId, factor: ConversionFactor) {
        if let Some(n) = self.nodes.get_mut(node.as_usize()) {
            match n.conversion_factors.iter_mut().find(|(f, _)| *f == flow) {
                Some(slot) => slot.1 = factor,
                None => n.conversion_factors.push((flow, factor)),
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// Build and validate the graph, returning an immutable `Graph`.
    ///
    /// This performs validation and constructs compact adjacency lists.
    pub fn build(self) -> GraphResult<Graph> {
        validate::validate_structure(&self.nodes, &self.flows, self.horizon)?;

        let (node_flow_offsets, node_flows) = Self::build_adjacency(&self.nodes, &self.flows);
        validate::validate_adjacency(&self.nodes, &self.flows, &node_flow_offsets, &node_flows)?;

        let mut labels: HashMap<NodeKind, HashMap<String, NodeId>> = HashMap::new();
        for node in &self.nodes {
            labels
                .entry(node.kind)
                .or_default()
                .insert(node.label.clone(), node.id);
        }

        Ok(Graph {
            horizon: self.horizon,
            nodes: self.nodes,
            flows: self.flows,
            node_flow_offsets,
            node_flows,
            labels,
        })
    }

    /// For each node, collect its incident flows.
    fn build_adjacency(nodes: &[Node], flows: &[Flow]) -> (Vec<usize>, Vec<FlowId>) {
        let mut node_to_flows: HashMap<NodeId, Vec<FlowId>> = HashMap::new();
        for flow in flows {
            node_to_flows.entry(flow.from).or_default().push(flow.id);
            if flow.to != flow.from {
                node_to_flows.entry(flow.to).or_default().push(flow.id);
            }
        }

        for list in node_to_flows.values_mut() {
            list.sort_by_key(|f| f.index());
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        let mut flat = Vec::new();
        offsets.push(0);
        for node in nodes {
            if let Some(list) = node_to_flows.get(&node.id) {
                flat.extend_from_slice(list);
            }
            offsets.push(flat.len());
        }

        (offsets, flat)
    }
}
