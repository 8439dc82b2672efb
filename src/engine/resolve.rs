// src/engine/resolve.rs

//! Edge-level result routing: given a producer's resolved outcome and the
//! consuming edge, pick out the one result the edge declares.

use crate::dag::Edge;
use crate::engine::outcome::{NodeOutcome, TaskResult};
use crate::errors::{RunError, TaskError};

/// Extract the result a consuming edge asks for from its producer's
/// outcome.
///
/// A failed producer propagates unchanged; the consumer deals with it at
/// its own aggregation step. A successful producer must carry the declared
/// `result_id` - anything else is a wiring bug and aborts the whole run
/// via [`RunError::MissingResult`] rather than being recorded as a
/// per-node failure.
pub(crate) fn resolve_edge_input<V: Clone>(
    edge: &Edge,
    outcome: NodeOutcome<V>,
) -> Result<Result<TaskResult<V>, TaskError>, RunError> {
    match outcome {
        NodeOutcome::Failure(err) => Ok(Err(err)),
        NodeOutcome::Success(results) => {
            match results.iter().find(|r| r.result_id == edge.result_id) {
                Some(result) => Ok(Ok(result.clone())),
                None => Err(RunError::MissingResult {
                    producer: edge.from.clone(),
                    result_id: edge.result_id.clone(),
                }),
            }
        }
    }
}
