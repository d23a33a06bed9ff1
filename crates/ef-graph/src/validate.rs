//! Graph validation logic.

use std::collections::{HashMap, HashSet};

use ef_core::{FlowId, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{CapacityMode, ConversionFactor, Flow, Node, NodeKind};

/// Validate the graph structure: references, topology, attributes.
pub(crate) fn validate_structure(nodes: &[Node], flows: &[Flow], horizon: usize) -> GraphResult<()> {
    // IDs are positions
    for (i, flow) in flows.iter().enumerate() {
        if flow.id.as_usize() != i {
            return Err(GraphError::InconsistentAdjacency {
                flow: flow.id,
                node: flow.from,
            });
        }
    }

    for flow in flows {
        for node in [flow.from, flow.to] {
            if node.as_usize() >= nodes.len() {
                return Err(GraphError::InvalidNodeRef {
                    flow: flow.id,
                    node,
                });
            }
        }
        let from = nodes[flow.from.as_usize()].kind;
        let to = nodes[flow.to.as_usize()].kind;
        if (from == NodeKind::Bus) == (to == NodeKind::Bus) {
            return Err(GraphError::InvalidEndpoints {
                flow: flow.id,
                from,
                to,
            });
        }
        validate_flow_attributes(flow, horizon)?;
    }

    let mut inputs = vec![0_usize; nodes.len()];
    let mut outputs = vec![0_usize; nodes.len()];
    let mut investments = vec![0_usize; nodes.len()];
    for flow in flows {
        outputs[flow.from.as_usize()] += 1;
        inputs[flow.to.as_usize()] += 1;
        if flow.capacity.is_some_and(|c| c.is_investment()) {
            investments[flow.from.as_usize()] += 1;
            investments[flow.to.as_usize()] += 1;
        }
    }

    let mut seen: HashSet<(NodeKind, &str)> = HashSet::new();
    for node in nodes {
        let i = node.id.as_usize();
        if !seen.insert((node.kind, node.label.as_str())) {
            return Err(GraphError::DuplicateLabel {
                kind: node.kind,
                label: node.label.clone(),
            });
        }

        let (n_in, n_out) = (inputs[i], outputs[i]);
        match node.kind {
            NodeKind::Bus => {}
            NodeKind::Source if n_in > 0 => {
                return Err(GraphError::WrongDirection {
                    node: node.id,
                    kind: node.kind,
                });
            }
            NodeKind::Sink if n_out > 0 => {
                return Err(GraphError::WrongDirection {
                    node: node.id,
                    kind: node.kind,
                });
            }
            NodeKind::Source | NodeKind::Sink if n_in + n_out != 1 => {
                return Err(GraphError::InvalidFlowCount {
                    node: node.id,
                    inputs: n_in,
                    outputs: n_out,
                });
            }
            NodeKind::Converter if n_in == 0 || n_out == 0 => {
                return Err(GraphError::InvalidFlowCount {
                    node: node.id,
                    inputs: n_in,
                    outputs: n_out,
                });
            }
            _ => {}
        }

        if node.kind != NodeKind::Bus && investments[i] > 1 {
            return Err(GraphError::MultipleInvestments {
                node: node.id,
                count: investments[i],
            });
        }

        validate_factors(node, flows, n_in + n_out, horizon)?;
    }

    Ok(())
}

fn validate_flow_attributes(flow: &Flow, horizon: usize) -> GraphResult<()> {
    if let Some(profile) = &flow.profile {
        if profile.values().len() != horizon {
            return Err(GraphError::LengthMismatch {
                what: "flow profile",
                expected: horizon,
                actual: profile.values().len(),
            });
        }
        if flow.capacity.is_none() {
            return Err(GraphError::ProfileWithoutCapacity { flow: flow.id });
        }
    }

    validate_operation(flow)?;

    let invalid = |what| GraphError::InvalidCapacity { flow: flow.id, what };
    match flow.capacity {
        None => {}
        Some(CapacityMode::Fixed(v)) => {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid("fixed capacity must be finite and non-negative"));
            }
        }
        Some(CapacityMode::Investment(spec)) => {
            let values = [spec.existing, spec.minimum, spec.maximum, spec.ep_costs];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(invalid("investment terms must be finite and non-negative"));
            }
            if spec.minimum > spec.maximum {
                return Err(invalid("investment minimum exceeds maximum"));
            }
        }
    }
    Ok(())
}

fn validate_operation(flow: &Flow) -> GraphResult<()> {
    let invalid = |what| GraphError::InvalidOperation { flow: flow.id, what };
    if let Some(limits) = flow.limits {
        if flow.capacity.is_none() {
            return Err(GraphError::OperationWithoutCapacity {
                flow: flow.id,
                what: "min/max limits",
            });
        }
        if !limits.min.is_finite() || !limits.max.is_finite() {
            return Err(invalid("min/max must be finite"));
        }
        if limits.min < 0.0 || limits.min > limits.max {
            return Err(invalid("min/max must satisfy 0 <= min <= max"));
        }
    }
    if let Some(nc) = flow.nonconvex {
        if flow.capacity.is_none() {
            return Err(GraphError::OperationWithoutCapacity {
                flow: flow.id,
                what: "on/off operation",
            });
        }
        let costs = [nc.startup_costs, nc.shutdown_costs];
        if costs.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(invalid("start-up and shut-down costs must be finite and non-negative"));
        }
    }
    Ok(())
}

fn validate_factors(
    node: &Node,
    flows: &[Flow],
    incident: usize,
    horizon: usize,
) -> GraphResult<()> {
    let factors = &node.conversion_factors;
    let expected = if node.kind == NodeKind::Converter {
        incident
    } else {
        0
    };
    let covered = factors
        .iter()
        .filter(|(f, _)| flows.get(f.as_usize()).is_some_and(|fl| fl.touches(node.id)))
        .count();
    if factors.len() != expected || covered != factors.len() {
        return Err(GraphError::FactorMismatch {
            node: node.id,
            flows: expected,
            factors: factors.len(),
        });
    }
    for (_, factor) in factors {
        if let ConversionFactor::Series(values) = factor {
            if values.len() != horizon {
                return Err(GraphError::LengthMismatch {
                    what: "conversion factor series",
                    expected: horizon,
                    actual: values.len(),
                });
            }
        }
    }
    Ok(())
}

/// Validate adjacency lists for consistency.
pub(crate) fn validate_adjacency(
    nodes: &[Node],
    flows: &[Flow],
    node_flow_offsets: &[usize],
    node_flows: &[FlowId],
) -> GraphResult<()> {
    if node_flow_offsets.len() != nodes.len() + 1 {
        return Err(GraphError::InconsistentAdjacency {
            flow: FlowId::from_index(0),
            node: nodes.first().map_or(NodeId::from_index(0), |n| n.id),
        });
    }

    let mut appearances: HashMap<FlowId, usize> = HashMap::new();
    for node in nodes {
        let idx = node.id.as_usize();
        let start = node_flow_offsets[idx];
        let end = node_flow_offsets[idx + 1];

        for &flow_id in &node_flows[start..end] {
            let touches = flows
                .get(flow_id.as_usize())
                .is_some_and(|f| f.touches(node.id));
            if !touches {
                return Err(GraphError::InconsistentAdjacency {
                    flow: flow_id,
                    node: node.id,
                });
            }
            *appearances.entry(flow_id).or_default() += 1;
        }
    }

    // every flow is listed at both of its endpoints
    for flow in flows {
        if appearances.get(&flow.id).copied().unwrap_or(0) != 2 {
            return Err(GraphError::InconsistentAdjacency {
                flow: flow.id,
                node: flow.from,
            });
        }
    }

    Ok(())
}
