use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DcfError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DcfError>;

/// Why a single analyzer invocation produced no report.
///
/// Every variant is terminal for that attempt only; the pipeline keeps the
/// last good snapshot.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("analyzer not found (probed: {})", display_paths(.probed))]
    AnalyzerNotFound { probed: Vec<PathBuf> },
    #[error("analyzer execution failed: {reason}{}", stderr_suffix(.stderr))]
    AnalyzerExecutionFailed {
        reason: ExecutionFailure,
        stderr: String,
    },
    #[error("malformed analyzer report: {0}")]
    MalformedReport(String),
}

#[derive(Error, Debug)]
pub enum ExecutionFailure {
    #[error("could not spawn process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed waiting for process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("exited with {}", describe_exit(.code, .signal))]
    Exit {
        code: Option<i32>,
        signal: Option<i32>,
    },
}

impl InvocationError {
    pub fn execution(reason: ExecutionFailure, stderr: impl Into<String>) -> Self {
        InvocationError::AnalyzerExecutionFailed {
            reason,
            stderr: stderr.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            InvocationError::AnalyzerExecutionFailed {
                reason: ExecutionFailure::TimedOut(_),
                ..
            }
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("; stderr: {}", trimmed)
    }
}

fn describe_exit(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("status {}", code),
        (None, Some(signal)) => format!("signal {}", signal),
        (None, None) => "unknown status".to_string(),
    }
}
