use async_trait::async_trait;
use dcf_core::DcfConfig;
use dcf_core::InvocationError;
use dcf_core::runtime::{AnalyzerInvoker, DiagnosticSink, Pipeline, ReportUpdate, TriggerScheduler};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".dcf",
    "__pycache__",
    "venv",
    ".venv",
    "node_modules",
    "target",
];

struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    async fn next_event_async(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await? {
                Ok(event) => return Some(event),
                Err(e) => warn!("watch error: {}", e),
            }
        }
    }
}

/// Changes under ignored directories (VCS, caches, virtualenvs) never
/// trigger a re-scan.
pub fn is_relevant_path(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    !relative.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name)),
        _ => false,
    })
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

struct ConsoleSink;

#[async_trait]
impl DiagnosticSink for ConsoleSink {
    async fn publish(&self, update: &ReportUpdate) {
        let report = &update.snapshot.report;
        let changed = update
            .publications
            .iter()
            .filter(|p| !p.diagnostics.is_empty())
            .count();
        info!(
            "Pass #{}: {} unused functions, {} commented-out blocks ({} files with findings)",
            update.generation(),
            report.unused_functions().count(),
            report.commented_code.len(),
            changed
        );
    }

    async fn report_failure(&self, error: &InvocationError) {
        warn!("Analysis failed, keeping previous results: {}", error);
    }
}

pub async fn run(path: PathBuf, config: DcfConfig) -> Result<(), Box<dyn std::error::Error>> {
    let worker = Arc::new(AnalyzerInvoker::from_config(&config.analyzer));
    let pipeline = Arc::new(Pipeline::new(worker, path.clone(), config.diagnostics.clone()));
    let cancel_token = CancellationToken::new();
    let scheduler = TriggerScheduler::spawn(
        pipeline,
        Arc::new(ConsoleSink),
        config.debounce(),
        cancel_token.clone(),
    );

    let mut watcher = FsWatcher::new(&path)?;
    info!("Watching {}. Press Ctrl+C to stop.", path.display());
    scheduler.run_now();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = watcher.next_event_async() => {
                let Some(event) = event else { break };
                if is_content_change(&event.kind)
                    && event.paths.iter().any(|p| is_relevant_path(&path, p))
                {
                    scheduler.notify_saved();
                }
            }
        }
    }

    cancel_token.cancel();
    info!("Watcher stopped.");
    Ok(())
}
