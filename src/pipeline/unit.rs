// src/pipeline/unit.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dag::ResultId;
use crate::engine::TaskResult;

/// One scheduler pass over the pipeline graph.
///
/// Phases are independent runs with a fresh worker pool and cancellation
/// flag each; the scheduler does not carry results from one phase into the
/// next. Units that need cross-phase state keep it themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Prepare,
    Init,
    Exec,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Prepare => "prepare",
            Phase::Init => "init",
            Phase::Exec => "exec",
        };
        f.write_str(name)
    }
}

/// Identity of one pipeline run, handed to every work-unit operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id: String,
    /// Partition values the run is scoped to (e.g. a load date). Opaque to
    /// the scheduler.
    #[serde(default)]
    pub partition_values: BTreeMap<String, String>,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            partition_values: BTreeMap::new(),
        }
    }

    pub fn with_partition(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.partition_values.insert(key.into(), value.into());
        self
    }
}

/// Tunables for pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Upper bound on concurrently executing unit operations.
    pub parallelism: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { parallelism: 1 }
    }
}

/// A unit of pipeline work with declared data dependencies.
///
/// `input_ids` name the results this unit consumes, `output_ids` the
/// results it must produce in every phase. Inputs no other unit produces
/// are fed from the synthetic `Init` source with `Value::default()`
/// placeholders.
///
/// Operations must be callable from any worker thread; each is invoked at
/// most once per phase run, with inputs in `input_ids` declaration order.
pub trait WorkUnit: Send + Sync + 'static {
    /// Value type carried by this pipeline's results.
    type Value: Clone + Default + Send + Sync + 'static;

    /// Stable id, unique within a pipeline.
    fn id(&self) -> &str;

    fn input_ids(&self) -> Vec<ResultId>;

    fn output_ids(&self) -> Vec<ResultId>;

    fn prepare(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<Self::Value>>,
    ) -> anyhow::Result<Vec<TaskResult<Self::Value>>>;

    fn init(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<Self::Value>>,
    ) -> anyhow::Result<Vec<TaskResult<Self::Value>>>;

    fn exec(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<Self::Value>>,
    ) -> anyhow::Result<Vec<TaskResult<Self::Value>>>;
}

impl<T: WorkUnit + ?Sized> WorkUnit for Box<T> {
    type Value = T::Value;

    fn id(&self) -> &str {
        (**self).id()
    }

    fn input_ids(&self) -> Vec<ResultId> {
        (**self).input_ids()
    }

    fn output_ids(&self) -> Vec<ResultId> {
        (**self).output_ids()
    }

    fn prepare(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<Self::Value>>,
    ) -> anyhow::Result<Vec<TaskResult<Self::Value>>> {
        (**self).prepare(ctx, inputs)
    }

    fn init(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<Self::Value>>,
    ) -> anyhow::Result<Vec<TaskResult<Self::Value>>> {
        (**self).init(ctx, inputs)
    }

    fn exec(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<Self::Value>>,
    ) -> anyhow::Result<Vec<TaskResult<Self::Value>>> {
        (**self).exec(ctx, inputs)
    }
}
