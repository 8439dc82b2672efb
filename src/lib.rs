// src/lib.rs

//! flowdag - a concurrent DAG task scheduler for data-pipeline runs.
//!
//! Work units declare the results they consume and produce; the scheduler
//! wires them into a directed acyclic graph, orders it topologically, and
//! executes every node's operation at most once per phase, as soon as all
//! of its inputs are ready, with bounded parallelism. Failures and
//! cancellation propagate along the graph; callers receive one outcome per
//! end-node result, with typed failure markers for skipped work.
//!
//! Layering:
//! - [`dag`]: graph model and validating builder (cycle detection,
//!   topological sort, the synthetic `Init` source)
//! - [`engine`]: lazy memoized per-node computations, edge-level result
//!   routing, and the runner with its per-phase worker pool
//! - [`pipeline`]: the orchestrator tying work units to the `prepare`,
//!   `init` and `exec` phases
//!
//! The scheduler owns no files, sockets or persistent state; one graph
//! means one in-memory run per phase.

pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod pipeline;

pub use dag::{Edge, Graph, GraphBuilder, Node, NodeId, ResultId, INIT_NODE_ID};
pub use engine::{CancelHandle, NodeOp, NodeOutcome, Runner, TaskOutcome, TaskResult, TaskRun};
pub use errors::{GraphError, PhaseError, PipelineError, RunError, TaskError};
pub use pipeline::{Phase, PhaseRun, Pipeline, PipelineOptions, RunContext, WorkUnit};
