//! Core graph data structures.

use std::collections::HashMap;

use ef_core::{FlowId, NodeId, Real};
use serde::Serialize;

/// Role of a node in the energy system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Balancing point for one commodity.
    Bus,
    /// Feeds exactly one bus.
    Source,
    /// Draws from exactly one bus.
    Sink,
    /// Turns input flows into output flows via conversion factors.
    Converter,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Bus => "bus",
            NodeKind::Source => "source",
            NodeKind::Sink => "sink",
            NodeKind::Converter => "converter",
        };
        f.write_str(name)
    }
}

/// Ratio of a converter flow to the converter's internal throughput.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionFactor {
    Constant(Real),
    Series(Vec<Real>),
}

impl ConversionFactor {
    /// Value at time step `t`. Constant factors ignore `t`.
    pub fn at(&self, t: usize) -> Option<Real> {
        match self {
            ConversionFactor::Constant(v) => Some(*v),
            ConversionFactor::Series(values) => values.get(t).copied(),
        }
    }
}

/// A node of the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    /// One entry per incident flow on converters; empty otherwise.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversion_factors: Vec<(FlowId, ConversionFactor)>,
}

impl Node {
    pub fn conversion_factor(&self, flow: FlowId) -> Option<&ConversionFactor> {
        self.conversion_factors
            .iter()
            .find(|(f, _)| *f == flow)
            .map(|(_, c)| c)
    }
}

/// Optimizer-sized capacity with bounds and an annualized unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvestmentSpec {
    pub existing: Real,
    pub minimum: Real,
    pub maximum: Real,
    pub ep_costs: Real,
}

/// How a flow's capacity is determined. Decided once at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    Fixed(Real),
    Investment(InvestmentSpec),
}

impl CapacityMode {
    pub fn is_investment(&self) -> bool {
        matches!(self, CapacityMode::Investment(_))
    }
}

/// Time profile bound to a flow, one value per step of the horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowProfile {
    /// Values the flow is pinned to (demand).
    Fix(Vec<Real>),
    /// Per-unit availability; the flow stays below `capacity * value`.
    Max(Vec<Real>),
}

impl FlowProfile {
    pub fn values(&self) -> &[Real] {
        match self {
            FlowProfile::Fix(v) | FlowProfile::Max(v) => v,
        }
    }
}

/// Per-unit bounds on a flow, as shares of its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowLimits {
    pub min: Real,
    pub max: Real,
}

/// On/off operation. A running flow stays within its limits, a stopped one
/// is zero; switching may cost and may be constrained in time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NonConvex {
    /// Steps the flow stays on once started.
    pub minimum_uptime: u32,
    /// Steps the flow stays off once stopped.
    pub minimum_downtime: u32,
    pub startup_costs: Real,
    pub shutdown_costs: Real,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_startups: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_shutdowns: Option<u32>,
    /// Whether the flow is on before the first step.
    pub initial_status: bool,
}

/// Directed, time-indexed quantity between a node and a bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flow {
    pub id: FlowId,
    pub from: NodeId,
    pub to: NodeId,
    pub capacity: Option<CapacityMode>,
    pub variable_costs: Real,
    pub profile: Option<FlowProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<FlowLimits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonconvex: Option<NonConvex>,
}

impl Flow {
    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}

/// The graph: a validated, immutable collection of nodes and flows.
///
/// Nodes and flows are stored in vectors indexed by their IDs. Each node
/// keeps a compact list of incident flows (inbound and outbound).
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    pub(crate) horizon: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) flows: Vec<Flow>,

    /// Node i's flows are in node_flows[node_flow_offsets[i]..node_flow_offsets[i+1]].
    #[serde(skip)]
    pub(crate) node_flow_offsets: Vec<usize>,

    /// Flat list of flow IDs incident to nodes, sorted by node then flow.
    #[serde(skip)]
    pub(crate) node_flows: Vec<FlowId>,

    #[serde(skip)]
    pub(crate) labels: HashMap<NodeKind, HashMap<String, NodeId>>,
}

impl Graph {
    /// Number of time steps every profile spans.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_usize())
    }

    /// Get a flow by ID (returns None if ID out of bounds).
    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(id.as_usize())
    }

    /// Look a node up by kind and label.
    pub fn find(&self, kind: NodeKind, label: &str) -> Option<&Node> {
        let id = self.labels.get(&kind)?.get(label)?;
        self.node(*id)
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// All flow IDs incident to a node.
    pub fn node_flows(&self, node_id: NodeId) -> &[FlowId] {
        let idx = node_id.as_usize();
        if idx >= self.nodes.len() {
            return &[];
        }
        let start = self.node_flow_offsets[idx];
        let end = self.node_flow_offsets[idx + 1];
        &self.node_flows[start..end]
    }

    /// Flows ending at `node_id`, in flow order.
    pub fn inputs(&self, node_id: NodeId) -> impl Iterator<Item = &Flow> {
        self.incident(node_id).filter(move |f| f.to == node_id)
    }

    /// Flows starting at `node_id`, in flow order.
    pub fn outputs(&self, node_id: NodeId) -> impl Iterator<Item = &Flow> {
        self.incident(node_id).filter(move |f| f.from == node_id)
    }

    pub fn investment_flows(&self) -> impl Iterator<Item = &Flow> {
        self.flows
            .iter()
            .filter(|f| f.capacity.is_some_and(|c| c.is_investment()))
    }

    fn incident(&self, node_id: NodeId) -> impl Iterator<Item = &Flow> {
        self.node_flows(node_id)
            .iter()
            .filter_map(|id| self.flow(*id))
    }
}
