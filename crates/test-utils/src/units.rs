use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use flowdag::{RunContext, TaskResult, WorkUnit};

type Compute = Arc<dyn Fn(i64) -> anyhow::Result<i64> + Send + Sync>;
type Hook = Arc<dyn Fn() + Send + Sync>;

/// One recorded call of a scripted unit's operation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Which phase method was called: "prepare", "init" or "exec".
    pub phase: &'static str,
    pub run_id: String,
    /// Inputs as `(result_id, value)` pairs, in the order they arrived.
    pub inputs: Vec<(String, i64)>,
}

/// Shared view into a [`ScriptedUnit`]'s recorded activity.
///
/// Clone it before moving the unit into a pipeline; counters stay shared.
#[derive(Clone, Default)]
pub struct UnitProbe {
    calls: Arc<AtomicUsize>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl UnitProbe {
    /// Total operation invocations across all phases.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Inputs of the first recorded invocation.
    pub fn first_inputs(&self) -> Vec<(String, i64)> {
        self.invocations
            .lock()
            .unwrap()
            .first()
            .map(|inv| inv.inputs.clone())
            .unwrap_or_default()
    }

    fn record(&self, phase: &'static str, run_id: &str, inputs: &[TaskResult<i64>]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.invocations.lock().unwrap().push(Invocation {
            phase,
            run_id: run_id.to_string(),
            inputs: inputs
                .iter()
                .map(|r| (r.result_id.clone(), r.value))
                .collect(),
        });
    }
}

/// Scripted work unit used across the integration tests.
///
/// Every phase applies the same scripted behaviour: sum the input values,
/// apply the unit's compute function and emit the outcome once per
/// declared output. Invocations are recorded through the probe.
pub struct ScriptedUnit {
    pub(crate) id: String,
    pub(crate) inputs: Vec<String>,
    pub(crate) outputs: Vec<String>,
    pub(crate) compute: Compute,
    pub(crate) on_invoke: Option<Hook>,
    pub(crate) probe: UnitProbe,
}

impl ScriptedUnit {
    /// Shared activity view; clone before handing the unit to a pipeline.
    pub fn probe(&self) -> UnitProbe {
        self.probe.clone()
    }

    fn invoke(
        &self,
        phase: &'static str,
        ctx: &RunContext,
        inputs: Vec<TaskResult<i64>>,
    ) -> anyhow::Result<Vec<TaskResult<i64>>> {
        self.probe.record(phase, &ctx.run_id, &inputs);
        if let Some(hook) = &self.on_invoke {
            hook();
        }
        let sum: i64 = inputs.iter().map(|r| r.value).sum();
        let out = (self.compute)(sum)?;
        Ok(self
            .outputs
            .iter()
            .map(|o| TaskResult::new(o.clone(), out))
            .collect())
    }
}

impl WorkUnit for ScriptedUnit {
    type Value = i64;

    fn id(&self) -> &str {
        &self.id
    }

    fn input_ids(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn output_ids(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn prepare(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<i64>>,
    ) -> anyhow::Result<Vec<TaskResult<i64>>> {
        self.invoke("prepare", ctx, inputs)
    }

    fn init(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<i64>>,
    ) -> anyhow::Result<Vec<TaskResult<i64>>> {
        self.invoke("init", ctx, inputs)
    }

    fn exec(
        &self,
        ctx: &RunContext,
        inputs: Vec<TaskResult<i64>>,
    ) -> anyhow::Result<Vec<TaskResult<i64>>> {
        self.invoke("exec", ctx, inputs)
    }
}
