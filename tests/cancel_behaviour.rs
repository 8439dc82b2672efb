use std::error::Error;
use std::sync::{Arc, Mutex};

use flowdag::{CancelHandle, Phase, Pipeline, PipelineOptions, RunContext, TaskError};
use flowdag_test_utils::builders::UnitBuilder;
use flowdag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn cancelling_mid_run_skips_nodes_that_have_not_started() -> TestResult {
    init_tracing();

    // Serial chain of five units; the second one requests cancellation from
    // inside its own operation, so it still completes while everything
    // downstream is skipped.
    let slot: Arc<Mutex<Option<CancelHandle>>> = Arc::new(Mutex::new(None));

    let n1 = UnitBuilder::new("n1").output("r1").constant(1).build();
    let n2 = UnitBuilder::new("n2")
        .input("r1")
        .output("r2")
        .compute({
            let slot = Arc::clone(&slot);
            move |sum| {
                if let Some(handle) = slot.lock().unwrap().as_ref() {
                    handle.cancel();
                }
                Ok(sum + 1)
            }
        })
        .build();
    let n3 = UnitBuilder::new("n3").input("r2").output("r3").build();
    let n4 = UnitBuilder::new("n4").input("r3").output("r4").build();
    let n5 = UnitBuilder::new("n5").input("r4").output("r5").build();

    let probes = [n1.probe(), n2.probe(), n3.probe(), n4.probe(), n5.probe()];

    let pipeline = Pipeline::new(
        vec![n1, n2, n3, n4, n5],
        RunContext::new("cancel-mid"),
        PipelineOptions::default(),
    )?;

    let phase = pipeline.phase(Phase::Exec);
    *slot.lock().unwrap() = Some(phase.cancel_handle());
    let outcomes = phase.run()?;

    assert_eq!(outcomes.len(), 1);
    let err = outcomes[0].err().expect("tail of the chain is cancelled");
    assert!(matches!(err, TaskError::Cancelled { .. }));
    assert_eq!(err.node(), "n5");

    // Exactly two operations started: n1 and n2.
    let calls: Vec<usize> = probes.iter().map(|p| p.calls()).collect();
    assert_eq!(calls, vec![1, 1, 0, 0, 0]);
    Ok(())
}

#[test]
fn cancelling_before_start_cancels_every_end_node() -> TestResult {
    init_tracing();

    let a = UnitBuilder::new("A").output("rA").build();
    let x = UnitBuilder::new("X").output("rX").build();

    let a_probe = a.probe();
    let x_probe = x.probe();

    let pipeline = Pipeline::new(
        vec![a, x],
        RunContext::new("cancel-early"),
        PipelineOptions { parallelism: 2 },
    )?;

    let phase = pipeline.phase(Phase::Exec);
    phase.cancel_handle().cancel();
    let outcomes = phase.run()?;

    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        let err = outcome.err().expect("every end node is cancelled");
        assert!(matches!(err, TaskError::Cancelled { .. }));
    }
    assert_eq!(a_probe.calls() + x_probe.calls(), 0);
    Ok(())
}

#[test]
fn cancellation_does_not_leak_into_the_next_phase_run() -> TestResult {
    init_tracing();

    let a = UnitBuilder::new("A").output("rA").constant(9).build();

    let pipeline = Pipeline::new(
        vec![a],
        RunContext::new("fresh-flag"),
        PipelineOptions::default(),
    )?;

    let cancelled = pipeline.phase(Phase::Exec);
    cancelled.cancel_handle().cancel();
    let outcomes = cancelled.run()?;
    assert!(outcomes[0].is_failure());

    // A new phase run gets a fresh cancellation flag.
    let outcomes = pipeline.exec()?;
    assert_eq!(outcomes[0].result().expect("fresh run succeeds").value, 9);
    Ok(())
}
