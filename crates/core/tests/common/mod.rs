#![allow(dead_code)]

use async_trait::async_trait;
use dcf_core::error::{ExecutionFailure, InvocationError};
use dcf_core::model::{AnalysisReport, CommentRecord, FunctionRecord, UsageSite};
use dcf_core::runtime::{AnalysisWorker, DiagnosticSink, ReportUpdate};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Worker returning queued results in order, then empty reports.
#[derive(Default)]
pub struct ScriptedWorker {
    results: Mutex<VecDeque<Result<AnalysisReport, InvocationError>>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn push(&self, result: Result<AnalysisReport, InvocationError>) -> &Self {
        self.results.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisWorker for ScriptedWorker {
    async fn analyze(&self, _workspace_root: &Path) -> Result<AnalysisReport, InvocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(AnalysisReport::default()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<ReportUpdate>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn updates(&self) -> Vec<ReportUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiagnosticSink for RecordingSink {
    async fn publish(&self, update: &ReportUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }

    async fn report_failure(&self, error: &InvocationError) {
        self.failures.lock().unwrap().push(error.to_string());
    }
}

pub fn unused(name: &str, file: &str, line: u32) -> FunctionRecord {
    FunctionRecord {
        name: name.to_string(),
        file: PathBuf::from(file),
        line,
        usage_count: 0,
        last_used: None,
    }
}

pub fn used(name: &str, file: &str, line: u32, count: u32, last: (&str, u32)) -> FunctionRecord {
    FunctionRecord {
        name: name.to_string(),
        file: PathBuf::from(file),
        line,
        usage_count: count,
        last_used: Some(UsageSite {
            file: PathBuf::from(last.0),
            line: last.1,
        }),
    }
}

pub fn comment(file: &str, line: u32, content: &str) -> CommentRecord {
    CommentRecord {
        file: PathBuf::from(file),
        line,
        content: content.to_string(),
    }
}

pub fn report(functions: Vec<FunctionRecord>, commented_code: Vec<CommentRecord>) -> AnalysisReport {
    AnalysisReport {
        functions,
        commented_code,
    }
}

pub fn timed_out() -> InvocationError {
    InvocationError::execution(ExecutionFailure::TimedOut(Duration::from_secs(30)), "")
}

pub fn malformed() -> InvocationError {
    InvocationError::MalformedReport("invalid JSON: expected value at line 1 column 1".into())
}
