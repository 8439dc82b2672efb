// src/pipeline/mod.rs

//! Run orchestration: wiring work units into a graph and driving phases.
//!
//! The pipeline derives the edge set from the units' declared inputs and
//! outputs, builds the graph exactly once, and exposes one scheduler run
//! per phase (`prepare`, `init`, `exec`) over that same topology.

mod unit;

pub use unit::{Phase, PipelineOptions, RunContext, WorkUnit};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::{Graph, GraphBuilder, Node, NodeId, ResultId, INIT_NODE_ID};
use crate::engine::{CancelHandle, NodeOp, Runner, TaskOutcome, TaskResult, TaskRun};
use crate::errors::{PhaseError, PipelineError};

/// Orchestrates work units over a single dependency graph.
pub struct Pipeline<U: WorkUnit> {
    graph: Graph<Arc<U>>,
    ctx: Arc<RunContext>,
    runner: Runner,
}

impl<U: WorkUnit> Pipeline<U> {
    /// Wire the units into a graph.
    ///
    /// For every input of every unit: if another unit declares it as an
    /// output, an edge from that producer is added; otherwise the input is
    /// fed from the synthetic `Init` source. Unit ids and declared outputs
    /// must be unique across the pipeline.
    pub fn new(
        units: Vec<U>,
        ctx: RunContext,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        let mut ids: HashSet<NodeId> = HashSet::with_capacity(units.len());
        for unit in &units {
            if !ids.insert(unit.id().to_string()) {
                return Err(PipelineError::DuplicateUnit(unit.id().to_string()));
            }
        }

        let mut producers: HashMap<ResultId, NodeId> = HashMap::new();
        for unit in &units {
            for output in unit.output_ids() {
                if let Some(first) = producers.get(&output) {
                    return Err(PipelineError::DuplicateOutput {
                        result_id: output.clone(),
                        first: first.clone(),
                        second: unit.id().to_string(),
                    });
                }
                producers.insert(output, unit.id().to_string());
            }
        }

        let mut builder = GraphBuilder::new();
        for unit in units {
            let id = unit.id().to_string();
            let inputs = unit.input_ids();
            builder = builder.node(id.clone(), Arc::new(unit));
            for input in inputs {
                let from = producers
                    .get(&input)
                    .cloned()
                    .unwrap_or_else(|| INIT_NODE_ID.to_string());
                builder = builder.edge(from, id.clone(), input);
            }
        }

        let graph = builder.build()?;
        debug!("{graph}");
        info!(
            run_id = %ctx.run_id,
            nodes = graph.len(),
            parallelism = options.parallelism,
            "pipeline graph built"
        );

        Ok(Self {
            graph,
            ctx: Arc::new(ctx),
            runner: Runner::new(options.parallelism),
        })
    }

    /// Immutable topology view (sorted nodes, adjacency, rendering).
    pub fn graph(&self) -> &Graph<Arc<U>> {
        &self.graph
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Construct (but do not start) one phase run over the graph.
    pub fn phase(&self, phase: Phase) -> PhaseRun<U::Value> {
        let run = TaskRun::build(&self.graph, self.phase_op(phase));
        PhaseRun {
            phase,
            run,
            runner: self.runner.clone(),
        }
    }

    pub fn prepare(&self) -> Result<Vec<TaskOutcome<U::Value>>, PhaseError> {
        self.phase(Phase::Prepare).run()
    }

    pub fn init(&self) -> Result<Vec<TaskOutcome<U::Value>>, PhaseError> {
        self.phase(Phase::Init).run()
    }

    pub fn exec(&self) -> Result<Vec<TaskOutcome<U::Value>>, PhaseError> {
        self.phase(Phase::Exec).run()
    }

    /// Run `prepare`, `init` and `exec` in order, returning the first
    /// phase's outcomes that contain a failure, or the `exec` outcomes.
    pub fn run_all_phases(&self) -> Result<Vec<TaskOutcome<U::Value>>, PhaseError> {
        for phase in [Phase::Prepare, Phase::Init] {
            let outcomes = self.phase(phase).run()?;
            if outcomes.iter().any(TaskOutcome::is_failure) {
                warn!(phase = %phase, "phase reported failures, skipping remaining phases");
                return Ok(outcomes);
            }
        }
        self.phase(Phase::Exec).run()
    }

    /// Node operation for one phase. `Init` seeds a placeholder result for
    /// every distinct graph-level input; unit nodes dispatch to the
    /// matching phase operation.
    fn phase_op(&self, phase: Phase) -> NodeOp<Arc<U>, U::Value> {
        let ctx = Arc::clone(&self.ctx);
        let mut seeds: Vec<ResultId> = Vec::new();
        for edge in self.graph.outgoing(INIT_NODE_ID) {
            if !seeds.contains(&edge.result_id) {
                seeds.push(edge.result_id.clone());
            }
        }

        Arc::new(move |node, inputs| match node {
            Node::Init => Ok(seeds
                .iter()
                .map(|id| TaskResult::new(id.clone(), U::Value::default()))
                .collect()),
            Node::Unit { payload, .. } => match phase {
                Phase::Prepare => payload.prepare(&ctx, inputs),
                Phase::Init => payload.init(&ctx, inputs),
                Phase::Exec => payload.exec(&ctx, inputs),
            },
        })
    }
}

/// A constructed-but-not-started phase run.
///
/// Grab the [`CancelHandle`] before calling [`PhaseRun::run`] if external
/// cancellation is needed; `run` blocks the calling thread until every end
/// node resolves.
pub struct PhaseRun<V: Clone> {
    phase: Phase,
    run: TaskRun<V>,
    runner: Runner,
}

impl<V> PhaseRun<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.run.cancel_handle()
    }

    /// Block until the phase completes; outcomes are ordered by end-node
    /// enumeration order, flattened within each node by its result order.
    pub fn run(self) -> Result<Vec<TaskOutcome<V>>, PhaseError> {
        info!(phase = %self.phase, "starting phase");
        self.runner.run(self.run)
    }
}
