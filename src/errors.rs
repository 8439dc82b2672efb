// src/errors.rs

//! Crate-wide error types.
//!
//! Construction-time problems (`GraphError`, `PipelineError`) are raised
//! synchronously and abort the caller. `RunError` aborts a whole phase run.
//! `TaskError` is attached to individual node outcomes and never escapes as
//! a panic or a run-level error.

use std::sync::Arc;

use thiserror::Error;

use crate::dag::{NodeId, ResultId};

/// Structural errors raised while building a [`Graph`](crate::dag::Graph).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The edge set contains at least one directed cycle. `remaining` holds
    /// every node that could not be placed in a topological order.
    #[error("cycle detected in task graph; unsortable nodes: {remaining:?}")]
    CycleDetected { remaining: Vec<NodeId> },

    #[error("duplicate edge '{from}' -> '{to}' for result '{result_id}'")]
    DuplicateEdge {
        from: NodeId,
        to: NodeId,
        result_id: ResultId,
    },

    #[error("edge '{from}' -> '{to}' references unknown node '{unknown}'")]
    UnknownNode {
        from: NodeId,
        to: NodeId,
        unknown: NodeId,
    },

    #[error("node ids must be non-empty")]
    EmptyNodeId,

    #[error("duplicate node id '{0}'")]
    DuplicateNode(NodeId),

    /// `__init__` is reserved for the synthetic source node.
    #[error("node id '{0}' is reserved")]
    ReservedNodeId(NodeId),
}

/// Programming errors that abort a whole phase run.
///
/// These are deliberately not recorded as per-node failures: a producer
/// that resolves without the result an edge declares is a wiring bug, and
/// swallowing it would let the rest of the run compute on garbage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("node '{producer}' produced no result named '{result_id}'")]
    MissingResult {
        producer: NodeId,
        result_id: ResultId,
    },
}

/// Failure attached to a single node's outcome.
///
/// `PredecessorFailed` chains back to the originating failure, so callers
/// can walk from any skipped end node to the node that actually broke.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// The node's operation returned an error (or panicked).
    #[error("operation of node '{node}' failed: {cause}")]
    OperationFailed {
        node: NodeId,
        cause: Arc<anyhow::Error>,
    },

    /// An upstream node failed, so this node never ran. `cause` is the
    /// failure of the first failed predecessor in edge declaration order.
    #[error("node '{node}' skipped, upstream failure: {cause}")]
    PredecessorFailed { node: NodeId, cause: Arc<TaskError> },

    /// The run was cancelled before this node entered its operation.
    #[error("node '{node}' cancelled before start")]
    Cancelled { node: NodeId },
}

impl TaskError {
    /// Id of the node this failure is attached to.
    pub fn node(&self) -> &str {
        match self {
            TaskError::OperationFailed { node, .. }
            | TaskError::PredecessorFailed { node, .. }
            | TaskError::Cancelled { node } => node,
        }
    }

    /// Walk the predecessor chain down to the originating failure.
    pub fn root_cause(&self) -> &TaskError {
        match self {
            TaskError::PredecessorFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Errors surfaced by a single phase run.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Run(#[from] RunError),

    /// The worker pool for the phase could not be created.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] std::io::Error),
}

/// Errors raised while assembling a pipeline from work units.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("duplicate work unit id '{0}'")]
    DuplicateUnit(NodeId),

    #[error("result '{result_id}' is declared as output of both '{first}' and '{second}'")]
    DuplicateOutput {
        result_id: ResultId,
        first: NodeId,
        second: NodeId,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}
