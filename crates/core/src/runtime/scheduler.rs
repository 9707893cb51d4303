//! Debounced trigger loop driving the pipeline.

use crate::error::InvocationError;
use crate::runtime::pipeline::{Pipeline, ReportUpdate};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Host side of a refresh: receives the diagnostic replacement plan.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    /// Publishes every entry of `update.publications` as one replacement.
    async fn publish(&self, update: &ReportUpdate);

    /// Optional side channel for failed runs. State is already retained.
    async fn report_failure(&self, _error: &InvocationError) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Saved,
    Now,
}

/// Cheap, cloneable handle used by the host to feed triggers.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Trigger>,
}

impl SchedulerHandle {
    /// Restarts the quiet period; one run fires once it elapses without
    /// another save.
    pub fn notify_saved(&self) {
        let _ = self.tx.send(Trigger::Saved);
    }

    /// Runs as soon as no other run is in flight.
    pub fn run_now(&self) {
        let _ = self.tx.send(Trigger::Now);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct TriggerScheduler;

impl TriggerScheduler {
    /// Spawns the trigger loop on the current tokio runtime.
    ///
    /// The loop exits when `cancel_token` fires or every handle is dropped.
    pub fn spawn(
        pipeline: Arc<Pipeline>,
        sink: Arc<dyn DiagnosticSink>,
        quiet_period: Duration,
        cancel_token: CancellationToken,
    ) -> SchedulerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(trigger_loop(pipeline, sink, quiet_period, cancel_token, rx));
        SchedulerHandle { tx }
    }
}

#[derive(Default)]
struct Pending {
    deadline: Option<Instant>,
    immediate: bool,
}

impl Pending {
    fn absorb(&mut self, trigger: Trigger, quiet_period: Duration) {
        match trigger {
            Trigger::Saved => self.deadline = Some(Instant::now() + quiet_period),
            Trigger::Now => self.immediate = true,
        }
    }
}

async fn trigger_loop(
    pipeline: Arc<Pipeline>,
    sink: Arc<dyn DiagnosticSink>,
    quiet_period: Duration,
    cancel_token: CancellationToken,
    mut rx: mpsc::UnboundedReceiver<Trigger>,
) {
    info!(
        "analysis scheduler started for {} (quiet period {:?})",
        pipeline.workspace_root().display(),
        quiet_period
    );
    let mut pending = Pending::default();

    loop {
        if pending.immediate {
            // An immediate run covers any save still waiting on its timer.
            pending = Pending::default();
            if !run_pass(&pipeline, sink.as_ref(), &cancel_token).await {
                break;
            }
            // Triggers that queued up during the run collapse into at most one
            // immediate run and one debounce window.
            while let Ok(trigger) = rx.try_recv() {
                pending.absorb(trigger, quiet_period);
            }
            continue;
        }

        let deadline = pending.deadline;
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            trigger = rx.recv() => match trigger {
                Some(trigger) => {
                    debug!("trigger received: {:?}", trigger);
                    pending.absorb(trigger, quiet_period);
                }
                None => break,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                pending.deadline = None;
                if !run_pass(&pipeline, sink.as_ref(), &cancel_token).await {
                    break;
                }
                while let Ok(trigger) = rx.try_recv() {
                    pending.absorb(trigger, quiet_period);
                }
            }
        }
    }

    info!("analysis scheduler stopped");
}

/// Returns `false` if cancelled mid-run.
async fn run_pass(
    pipeline: &Pipeline,
    sink: &dyn DiagnosticSink,
    cancel_token: &CancellationToken,
) -> bool {
    tokio::select! {
        _ = cancel_token.cancelled() => false,
        result = pipeline.refresh() => {
            match result {
                Ok(update) => sink.publish(&update).await,
                Err(e) => sink.report_failure(&e).await,
            }
            true
        }
    }
}
