// src/dag/graph.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable identity of a node within one graph.
pub type NodeId = String;

/// Name of a single result, produced by a node and consumed via an edge.
pub type ResultId = String;

/// Id of the synthetic source node that stands in for producers the graph
/// does not contain. Reserved; user nodes may not use it.
pub const INIT_NODE_ID: &str = "__init__";

/// A unit of computation: either the synthetic `Init` source or a user node
/// with an opaque payload.
///
/// The scheduler never inspects the payload; it dispatches on the variant
/// only, so that the operation callback can special-case `Init`.
#[derive(Debug)]
pub enum Node<P> {
    /// Synthetic producer for graph-level input edges.
    Init,
    /// User node carrying the caller's payload.
    Unit { id: NodeId, payload: P },
}

impl<P> Node<P> {
    pub fn id(&self) -> &str {
        match self {
            Node::Init => INIT_NODE_ID,
            Node::Unit { id, .. } => id.as_str(),
        }
    }

    pub fn is_init(&self) -> bool {
        matches!(self, Node::Init)
    }
}

/// A declared dependency: node `to` reads result `result_id` of node `from`.
///
/// The `(from, to, result_id)` triple is unique within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub result_id: ResultId,
}

impl Edge {
    pub fn new(
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        result_id: impl Into<ResultId>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            result_id: result_id.into(),
        }
    }
}

/// Immutable product of [`GraphBuilder`](crate::dag::GraphBuilder): the
/// topologically sorted node sequence plus adjacency views.
///
/// Incoming and outgoing edge lists keep edge declaration order; the
/// resolver and the fan-in barrier both rely on it (the first failed
/// predecessor *in declaration order* becomes a skipped node's cause).
#[derive(Debug)]
pub struct Graph<P> {
    pub(crate) sorted: Vec<Arc<Node<P>>>,
    pub(crate) incoming: HashMap<NodeId, Vec<Edge>>,
    pub(crate) outgoing: HashMap<NodeId, Vec<Edge>>,
    pub(crate) start_nodes: Vec<NodeId>,
    pub(crate) end_nodes: Vec<NodeId>,
}

impl<P> Graph<P> {
    /// Nodes in topological order: every edge's producer appears before its
    /// consumer.
    pub fn sorted_nodes(&self) -> &[Arc<Node<P>>] {
        &self.sorted
    }

    /// Incoming edges of `id`, in declaration order. Unknown ids yield an
    /// empty slice.
    pub fn incoming(&self, id: &str) -> &[Edge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Outgoing edges of `id`, in declaration order.
    pub fn outgoing(&self, id: &str) -> &[Edge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes with no incoming edges, in node declaration order.
    pub fn start_nodes(&self) -> &[NodeId] {
        &self.start_nodes
    }

    /// Nodes with no outgoing edges, in node declaration order. The outcome
    /// vector of a run is ordered by this enumeration.
    pub fn end_nodes(&self) -> &[NodeId] {
        &self.end_nodes
    }

    pub fn contains(&self, id: &str) -> bool {
        self.incoming.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Arc<Node<P>>> {
        self.sorted.iter().find(|n| n.id() == id)
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
}

impl<P> fmt::Display for Graph<P> {
    /// Deterministic rendering for logs: every node in topological order,
    /// every edge under its consumer.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "task graph ({} nodes):", self.sorted.len())?;
        for node in &self.sorted {
            writeln!(f, "  - {}", node.id())?;
            for edge in self.incoming(node.id()) {
                writeln!(f, "      <- {} ({})", edge.from, edge.result_id)?;
            }
        }
        Ok(())
    }
}
