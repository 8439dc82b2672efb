// src/engine/runner.rs

use tokio::runtime;
use tracing::debug;

use crate::engine::outcome::TaskOutcome;
use crate::engine::task_graph::TaskRun;
use crate::errors::PhaseError;

/// Drives one phase run on a dedicated worker pool.
///
/// Each call to [`Runner::run`] builds a fresh multi-threaded runtime with
/// `parallelism` workers, blocks until every end node resolves, and tears
/// the pool down. Node operations are plain blocking calls that occupy a
/// worker each, so at most `parallelism` of them execute concurrently;
/// tasks parked at their fan-in barrier cost no worker.
#[derive(Debug, Clone)]
pub struct Runner {
    parallelism: usize,
}

impl Runner {
    /// `parallelism` is clamped to at least 1.
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Block until the run completes and return the flattened outcome
    /// vector.
    ///
    /// Must not be called from inside an async context: the runner owns
    /// its own runtime. Cancellation goes through the handle obtained from
    /// [`TaskRun::cancel_handle`] before this call.
    pub fn run<V>(&self, run: TaskRun<V>) -> Result<Vec<TaskOutcome<V>>, PhaseError>
    where
        V: Clone + Send + Sync + 'static,
    {
        debug!(parallelism = self.parallelism, "starting worker pool");
        let pool = runtime::Builder::new_multi_thread()
            .worker_threads(self.parallelism)
            .thread_name("flowdag-worker")
            .build()?;

        let outcomes = pool.block_on(run.wait());

        // One pool per phase; dropping it here joins the workers.
        drop(pool);
        Ok(outcomes?)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(1)
    }
}
