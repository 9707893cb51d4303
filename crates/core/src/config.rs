//! Runtime configuration.
//!
//! Editors hand it over as LSP `initializationOptions`; the CLI builds it from
//! flags. Every field has a default so an empty object is a valid config.

use crate::error::{DcfError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RUNTIME: &str = "python";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DcfConfig {
    pub analyzer: AnalyzerConfig,
    pub debounce_ms: u64,
    pub diagnostics: DiagnosticsConfig,
}

impl Default for DcfConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl DcfConfig {
    /// Parses LSP `initializationOptions`. `None` and `null` yield defaults.
    pub fn from_initialization_options(options: Option<serde_json::Value>) -> Result<Self> {
        match options {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| DcfError::Config(format!("invalid initializationOptions: {}", e))),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Interpreter the analyzer script is handed to. `None` runs the analyzer
    /// directly as an executable.
    pub runtime: Option<String>,
    /// Explicit analyzer location; skips candidate probing.
    pub path: Option<PathBuf>,
    /// Base directory for relative candidates. Defaults to the directory of
    /// the running executable.
    pub install_dir: Option<PathBuf>,
    /// Probed in order, relative to `install_dir`.
    pub candidates: Vec<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            runtime: Some(DEFAULT_RUNTIME.to_string()),
            path: None,
            install_dir: None,
            candidates: default_candidates(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AnalyzerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolved_install_dir(&self) -> PathBuf {
        self.install_dir
            .clone()
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn default_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("cli.py"),
        PathBuf::from("analyzer").join("cli.py"),
        PathBuf::from("..").join("analyzer").join("cli.py"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosticsConfig {
    /// Append the commented-out snippet to the hint message.
    pub include_comment_snippet: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            include_comment_snippet: true,
        }
    }
}
