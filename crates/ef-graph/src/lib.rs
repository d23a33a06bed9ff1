//! ef-graph: compiled energy-system graph.
//!
//! Provides:
//! - Graph data structures (Node, Flow, capacity modes, profiles, operating limits)
//! - Incremental graph builder with structural validation
//! - Stable indexing for solver integration
//!
//! # Example
//!
//! ```
//! use ef_graph::{CapacityMode, FlowAttrs, FlowProfile, GraphBuilder, NodeKind};
//!
//! let mut builder = GraphBuilder::new(3);
//! let el = builder.add_node("electricity", NodeKind::Bus);
//! let demand = builder.add_node("demand", NodeKind::Sink);
//! builder.add_flow(
//!     el,
//!     demand,
//!     FlowAttrs {
//!         capacity: Some(CapacityMode::Fixed(10.0)),
//!         profile: Some(FlowProfile::Fix(vec![4.0, 5.0, 6.0])),
//!         ..Default::default()
//!     },
//! );
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.nodes().len(), 2);
//! assert_eq!(graph.flows().len(), 1);
//! assert_eq!(graph.horizon(), 3);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod indexing;
pub(crate) mod validate;

pub use builder::{FlowAttrs, GraphBuilder};
pub use error::{GraphError, GraphResult};
pub use graph::{
    CapacityMode, ConversionFactor, Flow, FlowLimits, FlowProfile, Graph, InvestmentSpec, Node,
    NodeKind, NonConvex,
};
pub use indexing::IndexMap;
