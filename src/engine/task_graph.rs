// src/engine/task_graph.rs

//! Lazy, memoized per-node computations over a sorted graph.
//!
//! Each node gets one shared future. On first demand it spawns its work as
//! its own task, awaits every incoming producer in parallel (the fan-in
//! barrier), routes each edge's result, and then decides in priority
//! order: cancelled, first predecessor failure, user operation. The
//! outcome is memoized; every consumer attaches to the same evaluation, so
//! the operation runs at most once per phase run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::dag::{Edge, Graph, Node, NodeId};
use crate::engine::outcome::{flatten_outcomes, NodeOutcome, TaskOutcome, TaskResult};
use crate::engine::resolve::resolve_edge_input;
use crate::errors::{RunError, TaskError};

/// User operation invoked once per node per phase run, after all of the
/// node's inputs resolved successfully. Inputs arrive in incoming-edge
/// declaration order; the returned bundle must contain one result per
/// outgoing edge's `result_id`.
pub type NodeOp<P, V> =
    Arc<dyn Fn(&Node<P>, Vec<TaskResult<V>>) -> anyhow::Result<Vec<TaskResult<V>>> + Send + Sync>;

/// One node's memoized computation; clones share a single evaluation.
type NodeComputation<V> = Shared<BoxFuture<'static, Result<NodeOutcome<V>, RunError>>>;

/// Cancels a running task graph. Cheap to clone and safe to use from any
/// thread while the runner blocks on the run.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    logged: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cooperative cancellation. Nodes that have not passed their
    /// fan-in barrier resolve as `Cancelled`; a node already inside its
    /// operation runs to completion.
    pub fn cancel(&self) {
        if !self.logged.swap(true, Ordering::Relaxed) {
            info!("cancellation requested");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Top-level handle over one phase run: the end-node computations plus the
/// run-scoped cancellation flag.
///
/// Building a run executes nothing; evaluation starts when the run is
/// awaited (directly, or through [`Runner::run`](crate::engine::Runner)).
pub struct TaskRun<V: Clone> {
    end_nodes: Vec<NodeComputation<V>>,
    cancel: CancelHandle,
}

impl<V> TaskRun<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Construct the lazy computation for every node of `graph` in
    /// topological order and collect the end-node handles.
    pub fn build<P>(graph: &Graph<P>, op: NodeOp<P, V>) -> Self
    where
        P: Send + Sync + 'static,
    {
        let token = CancellationToken::new();
        let mut computations: HashMap<NodeId, NodeComputation<V>> =
            HashMap::with_capacity(graph.len());

        for node in graph.sorted_nodes() {
            let incoming = graph.incoming(node.id()).to_vec();
            let producers: Vec<NodeComputation<V>> = incoming
                .iter()
                .map(|edge| {
                    computations
                        .get(edge.from.as_str())
                        .cloned()
                        .expect("graph is sorted, producers are built before consumers")
                })
                .collect();
            let computation = node_computation(
                Arc::clone(node),
                incoming,
                producers,
                Arc::clone(&op),
                token.clone(),
            );
            computations.insert(node.id().to_string(), computation);
        }

        let end_nodes = graph
            .end_nodes()
            .iter()
            .map(|id| {
                computations
                    .get(id.as_str())
                    .cloned()
                    .expect("end nodes are part of the sorted node set")
            })
            .collect();

        TaskRun {
            end_nodes,
            cancel: CancelHandle {
                token,
                logged: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    /// Handle for cancelling this run; grab it before handing the run to a
    /// blocking runner.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Await every end node, flatten the bundles into per-result outcomes
    /// and log the result-class summary.
    ///
    /// Must be awaited inside a tokio runtime; node work is spawned as
    /// tasks so independent nodes run in parallel.
    pub async fn wait(self) -> Result<Vec<TaskOutcome<V>>, RunError> {
        let bundles = future::join_all(self.end_nodes)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        let outcomes = flatten_outcomes(bundles);
        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        info!(
            succeeded = outcomes.len() - failed,
            failed, "phase finished"
        );
        Ok(outcomes)
    }
}

/// Assemble one node's computation.
///
/// The inner work is spawned as its own task on first poll, so sibling
/// nodes occupy separate workers; `Shared` memoizes the result for every
/// consumer. A panic inside the operation surfaces as `OperationFailed`
/// through the join handle.
fn node_computation<P, V>(
    node: Arc<Node<P>>,
    incoming: Vec<Edge>,
    producers: Vec<NodeComputation<V>>,
    op: NodeOp<P, V>,
    token: CancellationToken,
) -> NodeComputation<V>
where
    P: Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let id = node.id().to_string();
    let work = async move {
        // Fan-in barrier: all producers resolve before any decision.
        let resolved = future::join_all(producers).await;
        let mut inputs = Vec::with_capacity(resolved.len());
        for (edge, outcome) in incoming.iter().zip(resolved) {
            inputs.push(resolve_edge_input(edge, outcome?)?);
        }
        Ok(evaluate(&node, inputs, &op, &token))
    };

    async move {
        match tokio::spawn(work).await {
            Ok(result) => result,
            Err(join_err) => {
                error!(node = %id, error = %join_err, "node operation failed");
                Ok(NodeOutcome::Failure(TaskError::OperationFailed {
                    node: id.clone(),
                    cause: Arc::new(anyhow::anyhow!("node task panicked: {join_err}")),
                }))
            }
        }
    }
    .boxed()
    .shared()
}

/// Post-barrier decision for one node, in priority order: cancellation,
/// first predecessor failure in edge declaration order, user operation.
fn evaluate<P, V>(
    node: &Node<P>,
    inputs: Vec<Result<TaskResult<V>, TaskError>>,
    op: &NodeOp<P, V>,
    token: &CancellationToken,
) -> NodeOutcome<V>
where
    V: Clone,
{
    let id = node.id();

    if token.is_cancelled() {
        info!(node = %id, "skipping node, run cancelled");
        return NodeOutcome::Failure(TaskError::Cancelled {
            node: id.to_string(),
        });
    }

    let mut results = Vec::with_capacity(inputs.len());
    for input in inputs {
        match input {
            Ok(result) => results.push(result),
            Err(cause) => {
                warn!(node = %id, cause = %cause, "skipping node, predecessor failed");
                return NodeOutcome::Failure(TaskError::PredecessorFailed {
                    node: id.to_string(),
                    cause: Arc::new(cause),
                });
            }
        }
    }

    match op(node, results) {
        Ok(produced) => NodeOutcome::Success(Arc::new(produced)),
        Err(cause) => {
            error!(node = %id, error = %cause, "node operation failed");
            NodeOutcome::Failure(TaskError::OperationFailed {
                node: id.to_string(),
                cause: Arc::new(cause),
            })
        }
    }
}
