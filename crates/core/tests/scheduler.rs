mod common;

use common::*;
use dcf_core::config::DiagnosticsConfig;
use dcf_core::runtime::{Pipeline, SchedulerHandle, TriggerScheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

const QUIET: Duration = Duration::from_millis(500);

struct Harness {
    worker: Arc<ScriptedWorker>,
    sink: Arc<RecordingSink>,
    handle: SchedulerHandle,
    cancel: CancellationToken,
}

fn start(worker: ScriptedWorker) -> Harness {
    let worker = Arc::new(worker);
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Arc::new(Pipeline::new(
        worker.clone(),
        "/w",
        DiagnosticsConfig::default(),
    ));
    let cancel = CancellationToken::new();
    let handle = TriggerScheduler::spawn(pipeline, sink.clone(), QUIET, cancel.clone());
    Harness {
        worker,
        sink,
        handle,
        cancel,
    }
}

#[tokio::test(start_paused = true)]
async fn burst_of_saves_runs_once_after_last_save() {
    let h = start(ScriptedWorker::new());
    let begin = Instant::now();

    for _ in 0..5 {
        h.handle.notify_saved();
        sleep(Duration::from_millis(100)).await;
    }
    // Last save at +400ms, so nothing may run before +900ms.
    sleep(Duration::from_millis(300)).await;
    assert_eq!(h.worker.calls(), 0);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(h.worker.calls(), 1);
    let fired = h.worker.call_times()[0] - begin;
    assert!(fired >= Duration::from_millis(900), "fired at {fired:?}");
    assert!(fired < Duration::from_millis(1000), "fired at {fired:?}");
    assert_eq!(h.sink.updates().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn spaced_saves_each_run() {
    let h = start(ScriptedWorker::new());

    h.handle.notify_saved();
    sleep(Duration::from_millis(600)).await;
    h.handle.notify_saved();
    sleep(Duration::from_millis(600)).await;

    assert_eq!(h.worker.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn run_now_skips_the_quiet_period() {
    let h = start(ScriptedWorker::new());
    let begin = Instant::now();

    h.handle.notify_saved();
    h.handle.run_now();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(h.worker.calls(), 1);
    assert!(h.worker.call_times()[0] - begin < QUIET);

    // The pending save was covered by the immediate run.
    sleep(Duration::from_secs(2)).await;
    assert_eq!(h.worker.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn triggers_during_a_run_are_coalesced() {
    let h = start(ScriptedWorker::with_delay(Duration::from_secs(1)));

    h.handle.run_now();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(h.worker.calls(), 1);

    h.handle.run_now();
    h.handle.run_now();
    h.handle.notify_saved();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(h.worker.calls(), 2);
    assert_eq!(h.worker.max_in_flight(), 1);
    assert_eq!(h.sink.updates().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_runs_go_to_the_failure_channel() {
    let worker = ScriptedWorker::new();
    worker.push(Err(timed_out()));
    let h = start(worker);

    h.handle.run_now();
    sleep(Duration::from_millis(10)).await;

    assert!(h.sink.updates().is_empty());
    let failures = h.sink.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn cancelled_scheduler_ignores_triggers() {
    let h = start(ScriptedWorker::new());

    h.cancel.cancel();
    sleep(Duration::from_millis(10)).await;
    h.handle.notify_saved();
    h.handle.run_now();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(h.worker.calls(), 0);
    assert!(h.handle.is_closed());
}
