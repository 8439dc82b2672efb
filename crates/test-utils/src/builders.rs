#![allow(dead_code)]

use std::sync::Arc;

use anyhow::anyhow;

use crate::units::{ScriptedUnit, UnitProbe};

fn passthrough(sum: i64) -> anyhow::Result<i64> {
    Ok(sum)
}

/// Builder for [`ScriptedUnit`] to simplify test setup.
pub struct UnitBuilder {
    id: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    compute: Arc<dyn Fn(i64) -> anyhow::Result<i64> + Send + Sync>,
    on_invoke: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl UnitBuilder {
    /// New unit computing the identity over the sum of its inputs.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            inputs: vec![],
            outputs: vec![],
            compute: Arc::new(passthrough),
            on_invoke: None,
        }
    }

    pub fn input(mut self, result_id: &str) -> Self {
        self.inputs.push(result_id.to_string());
        self
    }

    pub fn output(mut self, result_id: &str) -> Self {
        self.outputs.push(result_id.to_string());
        self
    }

    /// Replace the scripted computation applied to the sum of the inputs.
    pub fn compute<F>(mut self, f: F) -> Self
    where
        F: Fn(i64) -> anyhow::Result<i64> + Send + Sync + 'static,
    {
        self.compute = Arc::new(f);
        self
    }

    /// Emit a constant regardless of inputs.
    pub fn constant(self, value: i64) -> Self {
        self.compute(move |_| Ok(value))
    }

    /// Make every invocation fail with the given message.
    pub fn fail_with(self, msg: &str) -> Self {
        let msg = msg.to_string();
        self.compute(move |_| Err(anyhow!("{msg}")))
    }

    /// Hook executed at the start of every invocation, before the
    /// computation runs.
    pub fn on_invoke<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_invoke = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> ScriptedUnit {
        ScriptedUnit {
            id: self.id,
            inputs: self.inputs,
            outputs: self.outputs,
            compute: self.compute,
            on_invoke: self.on_invoke,
            probe: UnitProbe::default(),
        }
    }
}
