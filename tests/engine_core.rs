// tests/engine_core.rs

mod common;

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

use sitepipe::engine::{
    CoreCommand, CoreRuntime, RunOutcome, Runtime, RuntimeEvent, RuntimeOptions,
    TriggerWhileRunningBehaviour,
};

use common::{FakeExecutor, init_tracing};

type TestResult = Result<(), Box<dyn Error>>;

const STYLES: &str = "less/**/*.less";
const SCRIPTS: &str = "js/*.js";

fn core(behaviour: TriggerWhileRunningBehaviour) -> CoreRuntime {
    CoreRuntime::new(behaviour, RuntimeOptions::default())
}

fn trigger(binding: &str) -> RuntimeEvent {
    RuntimeEvent::BindingTriggered {
        binding: binding.to_string(),
    }
}

fn completed(binding: &str, outcome: RunOutcome) -> RuntimeEvent {
    RuntimeEvent::BindingCompleted {
        binding: binding.to_string(),
        outcome,
    }
}

fn dispatch(binding: &str) -> Vec<CoreCommand> {
    vec![CoreCommand::Dispatch(binding.to_string())]
}

#[test]
fn idle_binding_is_dispatched_immediately() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue);

    let step = core.step(trigger(STYLES));

    assert_eq!(step.commands, dispatch(STYLES));
    assert!(step.keep_running);
    assert_eq!(core.running_count(STYLES), 1);
    assert!(!core.is_idle());
}

#[test]
fn queue_mode_coalesces_triggers_into_one_rerun() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue);
    core.step(trigger(STYLES));

    for _ in 0..3 {
        let step = core.step(trigger(STYLES));
        assert!(step.commands.is_empty());
    }
    assert!(!core.queue_is_empty());
    assert_eq!(core.running_count(STYLES), 1);

    let step = core.step(completed(STYLES, RunOutcome::Success));
    assert_eq!(step.commands, dispatch(STYLES));
    assert!(core.queue_is_empty());

    let step = core.step(completed(STYLES, RunOutcome::Success));
    assert!(step.commands.is_empty());
    assert!(core.is_idle());
}

#[test]
fn ignore_mode_drops_triggers_while_running() {
    let mut core = core(TriggerWhileRunningBehaviour::Ignore);
    core.step(trigger(STYLES));

    let step = core.step(trigger(STYLES));
    assert!(step.commands.is_empty());
    assert!(core.queue_is_empty());

    let step = core.step(completed(STYLES, RunOutcome::Success));
    assert!(step.commands.is_empty());
    assert!(core.is_idle());

    // Once idle, it can be triggered again.
    assert_eq!(core.step(trigger(STYLES)).commands, dispatch(STYLES));
}

#[test]
fn overlap_mode_starts_concurrent_runs() {
    let mut core = core(TriggerWhileRunningBehaviour::Overlap);
    core.step(trigger(STYLES));

    let step = core.step(trigger(STYLES));
    assert_eq!(step.commands, dispatch(STYLES));
    assert_eq!(core.running_count(STYLES), 2);

    core.step(completed(STYLES, RunOutcome::Success));
    assert_eq!(core.running_count(STYLES), 1);
    assert!(!core.is_idle());

    core.step(completed(STYLES, RunOutcome::Success));
    assert!(core.is_idle());
}

#[test]
fn bindings_do_not_block_each_other() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue);
    core.step(trigger(STYLES));

    let step = core.step(trigger(SCRIPTS));

    assert_eq!(step.commands, dispatch(SCRIPTS));
    assert_eq!(core.running_count(STYLES), 1);
    assert_eq!(core.running_count(SCRIPTS), 1);
}

#[test]
fn failed_run_keeps_watching_and_still_reruns() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue);
    core.step(trigger(STYLES));
    core.step(trigger(STYLES));

    let step = core.step(completed(STYLES, RunOutcome::Failed));

    assert!(step.keep_running);
    assert_eq!(step.commands, dispatch(STYLES));
}

#[test]
fn fatal_run_aborts_the_session() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue);
    core.step(trigger(STYLES));

    let step = core.step(completed(STYLES, RunOutcome::Fatal("disk full".to_string())));

    assert!(!step.keep_running);
    assert_eq!(step.commands, vec![CoreCommand::Abort("disk full".to_string())]);
}

#[test]
fn exit_when_idle_stops_after_the_last_completion() {
    let mut core = CoreRuntime::new(
        TriggerWhileRunningBehaviour::Queue,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    core.step(trigger(STYLES));
    core.step(trigger(SCRIPTS));

    assert!(core.step(completed(STYLES, RunOutcome::Success)).keep_running);
    assert!(!core.step(completed(SCRIPTS, RunOutcome::Success)).keep_running);
}

#[test]
fn shutdown_stops_the_loop() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue);

    let step = core.step(RuntimeEvent::ShutdownRequested);

    assert!(!step.keep_running);
    assert!(step.commands.is_empty());
}

#[tokio::test]
async fn runtime_coalesces_triggers_queued_before_completion() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    // The first trigger dispatches; its completion lands behind the other
    // two, which coalesce into one rerun.
    for _ in 0..3 {
        rt_tx.send(trigger(STYLES)).await?;
    }

    let core = CoreRuntime::new(
        TriggerWhileRunningBehaviour::Queue,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    let runtime = Runtime::new(core, rt_rx, executor);

    match timeout(Duration::from_secs(3), runtime.run()).await {
        Ok(result) => result?,
        Err(_) => panic!("runtime did not finish within 3 seconds"),
    }

    let runs = executed.lock().unwrap().clone();
    assert_eq!(runs, vec![STYLES.to_string(), STYLES.to_string()]);
    Ok(())
}

#[tokio::test]
async fn runtime_ignore_mode_runs_once() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    for _ in 0..3 {
        rt_tx.send(trigger(SCRIPTS)).await?;
    }

    let core = CoreRuntime::new(
        TriggerWhileRunningBehaviour::Ignore,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );

    timeout(Duration::from_secs(3), Runtime::new(core, rt_rx, executor).run()).await??;

    assert_eq!(executed.lock().unwrap().clone(), vec![SCRIPTS.to_string()]);
    Ok(())
}

#[tokio::test]
async fn runtime_returns_the_fatal_error() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone())
        .with_outcome(STYLES, RunOutcome::Fatal("cannot write build/css".to_string()));

    rt_tx.send(trigger(STYLES)).await?;

    let runtime = Runtime::new(core(TriggerWhileRunningBehaviour::Queue), rt_rx, executor);
    let result = timeout(Duration::from_secs(3), runtime.run()).await?;

    let err = result.expect_err("fatal outcome must end the runtime with an error");
    assert!(err.to_string().contains("cannot write build/css"));
    Ok(())
}

#[tokio::test]
async fn runtime_survives_failed_runs() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone())
        .with_outcome(SCRIPTS, RunOutcome::Failed);

    rt_tx.send(trigger(SCRIPTS)).await?;
    rt_tx.send(trigger(STYLES)).await?;

    let core = CoreRuntime::new(
        TriggerWhileRunningBehaviour::Queue,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    timeout(Duration::from_secs(3), Runtime::new(core, rt_rx, executor).run()).await??;

    assert_eq!(
        executed.lock().unwrap().clone(),
        vec![SCRIPTS.to_string(), STYLES.to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn runtime_stops_on_shutdown_request() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone()).manual();

    rt_tx.send(trigger(STYLES)).await?;
    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;

    let runtime = Runtime::new(core(TriggerWhileRunningBehaviour::Queue), rt_rx, executor);
    timeout(Duration::from_secs(3), runtime.run()).await??;

    assert_eq!(executed.lock().unwrap().clone(), vec![STYLES.to_string()]);
    Ok(())
}
