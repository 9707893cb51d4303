//! Locating and running the external analyzer process.

use crate::config::AnalyzerConfig;
use crate::error::{ExecutionFailure, InvocationError};
use crate::model::{AnalysisReport, decode_report};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Anything that can produce a full-workspace report.
///
/// The production implementation is [`AnalyzerInvoker`]; tests substitute
/// scripted workers.
#[async_trait]
pub trait AnalysisWorker: Send + Sync {
    async fn analyze(&self, workspace_root: &Path) -> Result<AnalysisReport, InvocationError>;
}

/// Resolves the analyzer location. Stateless, so it is consulted on every run.
#[derive(Debug, Clone)]
pub struct AnalyzerLocator {
    explicit: Option<PathBuf>,
    install_dir: PathBuf,
    candidates: Vec<PathBuf>,
}

impl AnalyzerLocator {
    pub fn new(install_dir: impl Into<PathBuf>, candidates: Vec<PathBuf>) -> Self {
        Self {
            explicit: None,
            install_dir: install_dir.into(),
            candidates,
        }
    }

    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let locator = Self::new(config.resolved_install_dir(), config.candidates.clone());
        match &config.path {
            Some(path) => locator.with_explicit(path.clone()),
            None => locator,
        }
    }

    /// Paths checked by [`resolve`](Self::resolve), in order.
    pub fn probe_paths(&self) -> Vec<PathBuf> {
        match &self.explicit {
            Some(path) => vec![self.install_dir.join(path)],
            None => self
                .candidates
                .iter()
                .map(|c| self.install_dir.join(c))
                .collect(),
        }
    }

    pub fn resolve(&self) -> Result<PathBuf, InvocationError> {
        let probed = self.probe_paths();
        match probed.iter().find(|p| p.is_file()) {
            Some(found) => Ok(found.clone()),
            None => Err(InvocationError::AnalyzerNotFound { probed }),
        }
    }
}

pub struct AnalyzerInvoker {
    locator: AnalyzerLocator,
    runtime: Option<String>,
    timeout: Duration,
}

impl AnalyzerInvoker {
    pub fn new(locator: AnalyzerLocator, runtime: Option<String>, timeout: Duration) -> Self {
        Self {
            locator,
            runtime,
            timeout,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(
            AnalyzerLocator::from_config(config),
            config.runtime.clone(),
            config.timeout(),
        )
    }

    /// Runs one full analysis of `workspace_root`.
    ///
    /// The child is killed if the timeout elapses or the returned future is
    /// dropped. Failures are never retried here.
    pub async fn run(&self, workspace_root: &Path) -> Result<AnalysisReport, InvocationError> {
        let analyzer = self.locator.resolve()?;

        let mut command = match &self.runtime {
            Some(runtime) => {
                let mut cmd = Command::new(runtime);
                cmd.arg(&analyzer);
                cmd
            }
            None => Command::new(&analyzer),
        };
        command
            .arg(workspace_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            analyzer = %analyzer.display(),
            runtime = ?self.runtime,
            root = %workspace_root.display(),
            "spawning analyzer"
        );
        let start = Instant::now();

        let mut child = command
            .spawn()
            .map_err(|e| InvocationError::execution(ExecutionFailure::Spawn(e), ""))?;

        // stderr is drained into a shared buffer so a timed-out run still
        // reports what it wrote before being killed.
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(drain(pipe, stderr_buf.clone())));
        let mut stdout_pipe = child.stdout.take();

        let finished = tokio::time::timeout(self.timeout, async {
            let mut stdout = Vec::new();
            let read_stdout = async {
                match stdout_pipe.as_mut() {
                    Some(pipe) => pipe.read_to_end(&mut stdout).await.map(|_| ()),
                    None => Ok(()),
                }
            };
            let (status, ()) = tokio::try_join!(child.wait(), read_stdout)?;
            Ok::<_, std::io::Error>((status, stdout))
        })
        .await;

        let (status, stdout) = match finished {
            Ok(Ok(done)) => {
                if let Some(task) = stderr_task {
                    let _ = task.await;
                }
                done
            }
            Ok(Err(e)) => {
                return Err(InvocationError::execution(
                    ExecutionFailure::Wait(e),
                    take_collected(&stderr_buf, stderr_task),
                ));
            }
            Err(_) => {
                let _ = child.kill().await;
                let stderr = take_collected(&stderr_buf, stderr_task);
                warn!(
                    "analyzer timed out after {:?}; stderr so far: {}",
                    self.timeout,
                    stderr.trim()
                );
                return Err(InvocationError::execution(
                    ExecutionFailure::TimedOut(self.timeout),
                    stderr,
                ));
            }
        };

        let stderr = take_collected(&stderr_buf, None);
        if !status.success() {
            return Err(InvocationError::execution(exit_failure(status), stderr));
        }
        if !stderr.trim().is_empty() {
            debug!("analyzer stderr: {}", stderr.trim());
        }

        let report = decode_report(&stdout)?;
        info!(
            "analyzer finished in {:?}: {} functions, {} commented-code blocks",
            start.elapsed(),
            report.functions.len(),
            report.commented_code.len()
        );
        Ok(report)
    }
}

#[async_trait]
impl AnalysisWorker for AnalyzerInvoker {
    async fn analyze(&self, workspace_root: &Path) -> Result<AnalysisReport, InvocationError> {
        self.run(workspace_root).await
    }
}

async fn drain(mut pipe: ChildStderr, sink: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }
}

/// Stops a still-running drain and returns everything captured so far.
fn take_collected(sink: &Mutex<Vec<u8>>, task: Option<JoinHandle<()>>) -> String {
    if let Some(task) = task {
        task.abort();
    }
    sink.lock()
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

fn exit_failure(status: ExitStatus) -> ExecutionFailure {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal = None;

    ExecutionFailure::Exit {
        code: status.code(),
        signal,
    }
}
