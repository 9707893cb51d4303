//! Per-workspace analysis session: pipeline, scheduler, providers, and the
//! sink that pushes results back to the client.

use crate::diagnostics::to_lsp_diagnostic;
use dcf_core::DcfConfig;
use dcf_core::InvocationError;
use dcf_core::features::{HoverProvider, LensProvider};
use dcf_core::runtime::{
    AnalyzerInvoker, DiagnosticSink, Pipeline, ReportUpdate, SchedulerHandle, TriggerScheduler,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp::Client;
use tower_lsp::lsp_types::{MessageType, Url};

pub struct Session {
    pub root: PathBuf,
    pub config: DcfConfig,
    pub pipeline: Arc<Pipeline>,
    pub scheduler: SchedulerHandle,
    pub lenses: LensProvider,
    pub hovers: HoverProvider,
}

/// Builds the pipeline for `root` and starts its background tasks.
///
/// Nothing runs until the first trigger; the caller issues the initial scan
/// once the client is initialized.
pub fn spawn_session(
    root: PathBuf,
    config: DcfConfig,
    client: Client,
    lens_refresh: bool,
    cancel_token: CancellationToken,
) -> Session {
    let worker = Arc::new(AnalyzerInvoker::from_config(&config.analyzer));
    let pipeline = Arc::new(Pipeline::new(
        worker,
        root.clone(),
        config.diagnostics.clone(),
    ));

    let sink = Arc::new(ClientSink {
        client: client.clone(),
        root: root.clone(),
    });
    let scheduler = TriggerScheduler::spawn(
        pipeline.clone(),
        sink,
        config.debounce(),
        cancel_token.clone(),
    );

    let lenses = LensProvider::new(pipeline.reader());
    let hovers = HoverProvider::new(pipeline.reader());

    if lens_refresh {
        spawn_lens_refresher(&lenses, client, cancel_token);
    }

    Session {
        root,
        config,
        pipeline,
        scheduler,
        lenses,
        hovers,
    }
}

impl Session {
    pub fn report_keys<'a>(&self, path: &'a Path) -> impl Iterator<Item = &'a Path> {
        report_keys(&self.root, path)
    }
}

/// Keys under which `path` may appear in a report: as given, then
/// relative to `root`.
pub fn report_keys<'a>(root: &Path, path: &'a Path) -> impl Iterator<Item = &'a Path> {
    std::iter::once(path).chain(path.strip_prefix(root).ok())
}

/// Client URI for a report file; relative entries live under `root`.
pub fn publish_uri(root: &Path, file: &Path) -> Option<Url> {
    Url::from_file_path(root.join(file)).ok()
}

fn spawn_lens_refresher(lenses: &LensProvider, client: Client, cancel_token: CancellationToken) {
    let mut updates = lenses.on_report_updated();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                generation = updates.next() => {
                    let Some(generation) = generation else { break };
                    tracing::debug!("report generation {} ready, refreshing code lenses", generation);
                    if let Err(e) = client.code_lens_refresh().await {
                        tracing::warn!("codeLens/refresh failed: {}", e);
                    }
                }
            }
        }
    });
}

pub struct ClientSink {
    client: Client,
    root: PathBuf,
}

#[tower_lsp::async_trait]
impl DiagnosticSink for ClientSink {
    async fn publish(&self, update: &ReportUpdate) {
        for entry in &update.publications {
            let Some(uri) = publish_uri(&self.root, &entry.file) else {
                tracing::warn!("cannot publish diagnostics for {}", entry.file.display());
                continue;
            };
            let diagnostics = entry.diagnostics.iter().map(to_lsp_diagnostic).collect();
            self.client.publish_diagnostics(uri, diagnostics, None).await;
        }

        self.client
            .log_message(
                MessageType::INFO,
                format!(
                    "Dead code analysis #{}: {} unused functions, {} commented-out blocks",
                    update.generation(),
                    update.snapshot.report.unused_functions().count(),
                    update.snapshot.report.commented_code.len()
                ),
            )
            .await;
    }

    async fn report_failure(&self, error: &InvocationError) {
        self.client
            .log_message(
                MessageType::WARNING,
                format!("Dead code analysis failed, keeping previous results: {}", error),
            )
            .await;
    }
}
