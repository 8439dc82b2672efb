// src/dag/build.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::info;

use crate::dag::graph::{Edge, Graph, Node, NodeId, ResultId, INIT_NODE_ID};
use crate::errors::GraphError;

/// Validating builder for [`Graph`].
///
/// Checks performed by [`GraphBuilder::build`]:
/// - node ids are non-empty, unique and not the reserved `__init__`
/// - every edge endpoint references a declared node (or the synthetic
///   `Init` source, for `from`)
/// - no `(from, to, result_id)` triple appears twice
/// - the edge set is acyclic
///
/// When any edge names `Init` as its producer, the synthetic node is
/// materialized at the front of the node set so that every consumer has a
/// live predecessor.
pub struct GraphBuilder<P> {
    nodes: Vec<(NodeId, P)>,
    edges: Vec<Edge>,
}

impl<P> GraphBuilder<P> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Declare a node. Declaration order determines start/end node
    /// enumeration order.
    pub fn node(mut self, id: impl Into<NodeId>, payload: P) -> Self {
        self.nodes.push((id.into(), payload));
        self
    }

    /// Declare that `to` reads result `result_id` of `from`.
    pub fn edge(
        mut self,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        result_id: impl Into<ResultId>,
    ) -> Self {
        self.edges.push(Edge::new(from, to, result_id));
        self
    }

    /// Validate and topologically sort the declared graph.
    pub fn build(self) -> Result<Graph<P>, GraphError> {
        let Self { nodes, edges } = self;

        let mut known: HashSet<&str> = HashSet::with_capacity(nodes.len());
        for (id, _) in &nodes {
            if id.is_empty() {
                return Err(GraphError::EmptyNodeId);
            }
            if id == INIT_NODE_ID {
                return Err(GraphError::ReservedNodeId(id.clone()));
            }
            if !known.insert(id.as_str()) {
                return Err(GraphError::DuplicateNode(id.clone()));
            }
        }

        let mut seen_edges: HashSet<(&str, &str, &str)> = HashSet::with_capacity(edges.len());
        for edge in &edges {
            if !seen_edges.insert((
                edge.from.as_str(),
                edge.to.as_str(),
                edge.result_id.as_str(),
            )) {
                return Err(GraphError::DuplicateEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    result_id: edge.result_id.clone(),
                });
            }
            if edge.from != INIT_NODE_ID && !known.contains(edge.from.as_str()) {
                return Err(GraphError::UnknownNode {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    unknown: edge.from.clone(),
                });
            }
            if !known.contains(edge.to.as_str()) {
                return Err(GraphError::UnknownNode {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    unknown: edge.to.clone(),
                });
            }
        }

        let needs_init = edges.iter().any(|e| e.from == INIT_NODE_ID);

        let mut all: Vec<Arc<Node<P>>> = Vec::with_capacity(nodes.len() + 1);
        if needs_init {
            all.push(Arc::new(Node::Init));
        }
        for (id, payload) in nodes {
            all.push(Arc::new(Node::Unit { id, payload }));
        }

        let declared: Vec<NodeId> = all.iter().map(|n| n.id().to_string()).collect();

        let mut incoming: HashMap<NodeId, Vec<Edge>> = HashMap::with_capacity(declared.len());
        let mut outgoing: HashMap<NodeId, Vec<Edge>> = HashMap::with_capacity(declared.len());
        for id in &declared {
            incoming.insert(id.clone(), Vec::new());
            outgoing.insert(id.clone(), Vec::new());
        }
        for edge in &edges {
            if let Some(list) = incoming.get_mut(&edge.to) {
                list.push(edge.clone());
            }
            if let Some(list) = outgoing.get_mut(&edge.from) {
                list.push(edge.clone());
            }
        }

        let order = toposort(&declared, &incoming)?;
        info!(order = ?order, "task graph sorted");

        let mut by_id: HashMap<&str, &Arc<Node<P>>> =
            all.iter().map(|node| (node.id(), node)).collect();
        let sorted: Vec<Arc<Node<P>>> = order
            .iter()
            .map(|id| {
                let node = by_id
                    .remove(id.as_str())
                    .expect("toposort output is a permutation of the declared nodes");
                Arc::clone(node)
            })
            .collect();

        let start_nodes = declared
            .iter()
            .filter(|id| incoming[*id].is_empty())
            .cloned()
            .collect();
        let end_nodes = declared
            .iter()
            .filter(|id| outgoing[*id].is_empty())
            .cloned()
            .collect();

        Ok(Graph {
            sorted,
            incoming,
            outgoing,
            start_nodes,
            end_nodes,
        })
    }
}

impl<P> Default for GraphBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Topological sort by repeated source peeling.
///
/// Each step collects the *front*: every remaining node whose pending
/// incoming list is empty. The front is appended to the order (in node
/// declaration order), its ids are removed from all other pending lists,
/// and the step repeats. An empty front with nodes still pending means
/// those nodes form (or depend on) a cycle; all of them are reported.
fn toposort(
    declared: &[NodeId],
    incoming: &HashMap<NodeId, Vec<Edge>>,
) -> Result<Vec<NodeId>, GraphError> {
    let mut pending: HashMap<NodeId, Vec<NodeId>> = declared
        .iter()
        .map(|id| {
            let deps = incoming[id].iter().map(|e| e.from.clone()).collect();
            (id.clone(), deps)
        })
        .collect();

    let mut order: Vec<NodeId> = Vec::with_capacity(declared.len());
    while !pending.is_empty() {
        let front: Vec<NodeId> = declared
            .iter()
            .filter(|id| pending.get(*id).is_some_and(|deps| deps.is_empty()))
            .cloned()
            .collect();

        if front.is_empty() {
            let mut remaining: Vec<NodeId> = pending.into_keys().collect();
            remaining.sort();
            return Err(GraphError::CycleDetected { remaining });
        }

        for id in &front {
            pending.remove(id);
        }
        let peeled: HashSet<&str> = front.iter().map(NodeId::as_str).collect();
        for deps in pending.values_mut() {
            deps.retain(|dep| !peeled.contains(dep.as_str()));
        }
        order.extend(front);
    }

    Ok(order)
}
