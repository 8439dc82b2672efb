// src/dag/mod.rs

//! DAG representation and construction.
//!
//! - [`graph`] holds the immutable, topologically sorted task graph.
//! - [`build`] contains the validating builder: id checks, duplicate-edge
//!   rejection, cycle detection and the topological sort itself.

pub mod build;
pub mod graph;

pub use build::GraphBuilder;
pub use graph::{Edge, Graph, Node, NodeId, ResultId, INIT_NODE_ID};
