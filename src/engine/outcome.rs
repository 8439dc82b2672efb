// src/engine/outcome.rs

use std::sync::Arc;

use crate::dag::ResultId;
use crate::errors::TaskError;

/// A single value produced by a node, addressable by downstream edges
/// through its `result_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult<V> {
    pub result_id: ResultId,
    pub value: V,
}

impl<V> TaskResult<V> {
    pub fn new(result_id: impl Into<ResultId>, value: V) -> Self {
        Self {
            result_id: result_id.into(),
            value,
        }
    }
}

/// Terminal status of one node in one phase run: the full result bundle,
/// or the failure that stopped the node.
///
/// The bundle is `Arc`-shared because every consumer of the node holds a
/// clone of the memoized outcome.
#[derive(Debug, Clone)]
pub enum NodeOutcome<V> {
    Success(Arc<Vec<TaskResult<V>>>),
    Failure(TaskError),
}

/// Per-result view returned to callers: a success bundle of `n` results
/// flattens to `n` `Success` entries, a failure stays a single entry.
#[derive(Debug, Clone)]
pub enum TaskOutcome<V> {
    Success(TaskResult<V>),
    Failure(TaskError),
}

impl<V> TaskOutcome<V> {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failure(_))
    }

    pub fn result(&self) -> Option<&TaskResult<V>> {
        match self {
            TaskOutcome::Success(result) => Some(result),
            TaskOutcome::Failure(_) => None,
        }
    }

    pub fn err(&self) -> Option<&TaskError> {
        match self {
            TaskOutcome::Success(_) => None,
            TaskOutcome::Failure(err) => Some(err),
        }
    }
}

/// Flatten end-node bundles into the per-result outcome vector, keeping
/// end-node enumeration order and, within a node, its own result order.
pub(crate) fn flatten_outcomes<V: Clone>(bundles: Vec<NodeOutcome<V>>) -> Vec<TaskOutcome<V>> {
    let mut outcomes = Vec::with_capacity(bundles.len());
    for bundle in bundles {
        match bundle {
            NodeOutcome::Success(results) => {
                outcomes.extend(results.iter().cloned().map(TaskOutcome::Success));
            }
            NodeOutcome::Failure(err) => outcomes.push(TaskOutcome::Failure(err)),
        }
    }
    outcomes
}
