//! Owned synchronization pipeline: worker → index + diagnostics → snapshot.
//!
//! The current state is a single immutable [`Snapshot`] held in a watch
//! channel. A successful run builds a new snapshot and swaps it in one step;
//! readers either see the old one or the new one, never a mix. Failed runs
//! leave the channel untouched.

use crate::config::DiagnosticsConfig;
use crate::error::InvocationError;
use crate::index::ResultIndex;
use crate::model::AnalysisReport;
use crate::reconcile::{DiagnosticSet, FileDiagnostics, publication_plan, reconcile};
use crate::runtime::invoker::AnalysisWorker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct Snapshot {
    /// 0 until the first successful run, then +1 per run.
    pub generation: u64,
    pub report: AnalysisReport,
    pub index: ResultIndex,
    pub diagnostics: DiagnosticSet,
}

impl Snapshot {
    fn build(generation: u64, report: AnalysisReport, config: &DiagnosticsConfig) -> Self {
        let index = ResultIndex::from_report(&report);
        let diagnostics = reconcile(&report, config);
        Self {
            generation,
            report,
            index,
            diagnostics,
        }
    }
}

/// Read-only handle to the latest snapshot.
#[derive(Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Arc<Snapshot>>,
}

impl SnapshotReader {
    pub fn current(&self) -> Arc<Snapshot> {
        self.rx.borrow().clone()
    }

    /// Waits for the next successful run and returns its generation.
    /// `None` once the pipeline is gone.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().generation)
    }
}

/// Result of a successful run, handed to the host.
#[derive(Debug, Clone)]
pub struct ReportUpdate {
    pub snapshot: Arc<Snapshot>,
    /// Replacement diagnostics for every file present before or after.
    pub publications: Vec<FileDiagnostics>,
}

impl ReportUpdate {
    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }
}

pub struct Pipeline {
    worker: Arc<dyn AnalysisWorker>,
    workspace_root: PathBuf,
    diagnostics_config: DiagnosticsConfig,
    state: watch::Sender<Arc<Snapshot>>,
    // Held across invoke + swap so two runs never overlap.
    run_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        worker: Arc<dyn AnalysisWorker>,
        workspace_root: impl Into<PathBuf>,
        diagnostics_config: DiagnosticsConfig,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            worker,
            workspace_root: workspace_root.into(),
            diagnostics_config,
            state,
            run_lock: Mutex::new(()),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.state.borrow().clone()
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.state.subscribe(),
        }
    }

    /// Runs the worker once and, on success, publishes a new snapshot.
    ///
    /// Concurrent callers queue behind the in-flight run.
    pub async fn refresh(&self) -> Result<ReportUpdate, InvocationError> {
        let _guard = self.run_lock.lock().await;
        let start = Instant::now();

        match self.worker.analyze(&self.workspace_root).await {
            Ok(report) => {
                let update = self.apply(report);
                info!(
                    "analysis pass {} applied in {:?}: {} diagnostics across {} files",
                    update.generation(),
                    start.elapsed(),
                    update.snapshot.diagnostics.total(),
                    update.publications.len()
                );
                Ok(update)
            }
            Err(e) => {
                warn!(
                    "analysis of {} failed, keeping generation {}: {}",
                    self.workspace_root.display(),
                    self.state.borrow().generation,
                    e
                );
                Err(e)
            }
        }
    }

    /// Swaps in a snapshot built from `report`, bypassing the worker.
    pub fn apply(&self, report: AnalysisReport) -> ReportUpdate {
        let mut publications = Vec::new();
        let mut installed = None;
        self.state.send_modify(|current| {
            let next = Arc::new(Snapshot::build(
                current.generation + 1,
                report,
                &self.diagnostics_config,
            ));
            publications = publication_plan(&current.diagnostics, &next.diagnostics);
            installed = Some(next.clone());
            *current = next;
        });

        let snapshot = installed.unwrap_or_else(|| self.current());
        ReportUpdate {
            snapshot,
            publications,
        }
    }
}
