//! Graph-specific error types.

use ef_core::{EfError, FlowId, NodeId};

use crate::graph::NodeKind;

pub type GraphResult<T> = Result<T, GraphError>;

/// Structural invariant violations found while freezing a graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A flow refers to a node that doesn't exist.
    InvalidNodeRef { flow: FlowId, node: NodeId },

    /// A flow must join exactly one bus and one non-bus node.
    InvalidEndpoints {
        flow: FlowId,
        from: NodeKind,
        to: NodeKind,
    },

    /// A source with inbound flows or a sink with outbound flows.
    WrongDirection { node: NodeId, kind: NodeKind },

    /// A source or sink without exactly one flow, or a converter missing a side.
    InvalidFlowCount {
        node: NodeId,
        inputs: usize,
        outputs: usize,
    },

    /// Converter factors don't cover exactly its incident flows.
    FactorMismatch {
        node: NodeId,
        flows: usize,
        factors: usize,
    },

    /// More than one investment flow attached to a node.
    MultipleInvestments { node: NodeId, count: usize },

    /// Two nodes of the same kind share a label.
    DuplicateLabel { kind: NodeKind, label: String },

    /// A profile or series factor whose length differs from the horizon.
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A profiled flow without a capacity to scale it.
    ProfileWithoutCapacity { flow: FlowId },

    /// A capacity bound that is negative, non-finite or inverted.
    InvalidCapacity { flow: FlowId, what: &'static str },

    /// Per-unit limits or on/off operation on a flow without capacity.
    OperationWithoutCapacity { flow: FlowId, what: &'static str },

    /// Limits or on/off terms outside their domain.
    InvalidOperation { flow: FlowId, what: &'static str },

    /// Adjacency list is inconsistent (flow listed at a node it doesn't touch).
    InconsistentAdjacency { flow: FlowId, node: NodeId },

    /// ID not found in index map.
    IdNotFound { what: &'static str },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidNodeRef { flow, node } => {
                write!(f, "Flow {} refers to non-existent node {}", flow, node)
            }
            GraphError::InvalidEndpoints { flow, from, to } => {
                write!(
                    f,
                    "Flow {} joins {} to {} (needs exactly one bus)",
                    flow, from, to
                )
            }
            GraphError::WrongDirection { node, kind } => {
                write!(f, "{} node {} has a flow in the wrong direction", kind, node)
            }
            GraphError::InvalidFlowCount {
                node,
                inputs,
                outputs,
            } => {
                write!(
                    f,
                    "Node {} has {} inputs and {} outputs",
                    node, inputs, outputs
                )
            }
            GraphError::FactorMismatch {
                node,
                flows,
                factors,
            } => {
                write!(
                    f,
                    "Converter {} has {} flows but {} conversion factors",
                    node, flows, factors
                )
            }
            GraphError::MultipleInvestments { node, count } => {
                write!(f, "Node {} has {} investment flows (max 1)", node, count)
            }
            GraphError::DuplicateLabel { kind, label } => {
                write!(f, "Duplicate {} label '{}'", kind, label)
            }
            GraphError::LengthMismatch {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{} has length {} but the horizon is {}",
                    what, actual, expected
                )
            }
            GraphError::ProfileWithoutCapacity { flow } => {
                write!(f, "Flow {} has a profile but no capacity", flow)
            }
            GraphError::InvalidCapacity { flow, what } => {
                write!(f, "Flow {} has an invalid capacity: {}", flow, what)
            }
            GraphError::OperationWithoutCapacity { flow, what } => {
                write!(f, "Flow {} has {} but no capacity", flow, what)
            }
            GraphError::InvalidOperation { flow, what } => {
                write!(f, "Flow {} has invalid operating terms: {}", flow, what)
            }
            GraphError::InconsistentAdjacency { flow, node } => {
                write!(
                    f,
                    "Flow {} in node {}'s adjacency list but doesn't touch that node",
                    flow, node
                )
            }
            GraphError::IdNotFound { what } => {
                write!(f, "{} not found in index map", what)
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for EfError {
    fn from(err: GraphError) -> Self {
        EfError::Invariant {
            what: err.to_string(),
        }
    }
}
