//! Turns a report into per-file diagnostics and plans their publication.

use crate::config::DiagnosticsConfig;
use crate::model::AnalysisReport;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const UNUSED_FUNCTION_MESSAGE: &str = "Unused function";
pub const COMMENTED_CODE_MESSAGE: &str = "Commented-out code";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Hint,
}

/// A finding covering one whole source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    /// 1-based; converted by the host adapter.
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticSet {
    files: BTreeMap<PathBuf, Vec<DiagnosticRecord>>,
}

impl DiagnosticSet {
    pub fn get(&self, file: &Path) -> Option<&[DiagnosticRecord]> {
        self.files.get(file).map(Vec::as_slice)
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[DiagnosticRecord])> {
        self.files.iter().map(|(p, d)| (p.as_path(), d.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn push(&mut self, file: &Path, record: DiagnosticRecord) {
        self.files.entry(file.to_path_buf()).or_default().push(record);
    }
}

/// The replacement list for one file. An empty `diagnostics` clears the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostics {
    pub file: PathBuf,
    pub diagnostics: Vec<DiagnosticRecord>,
}

pub fn reconcile(report: &AnalysisReport, config: &DiagnosticsConfig) -> DiagnosticSet {
    let mut set = DiagnosticSet::default();

    for f in report.unused_functions() {
        set.push(
            &f.file,
            DiagnosticRecord {
                severity: Severity::Warning,
                line: f.line,
                message: UNUSED_FUNCTION_MESSAGE.to_string(),
            },
        );
    }

    for c in &report.commented_code {
        let snippet = c.content.trim();
        let message = if config.include_comment_snippet && !snippet.is_empty() {
            format!("{}: {}", COMMENTED_CODE_MESSAGE, snippet)
        } else {
            COMMENTED_CODE_MESSAGE.to_string()
        };
        set.push(
            &c.file,
            DiagnosticRecord {
                severity: Severity::Hint,
                line: c.line,
                message,
            },
        );
    }

    set
}

/// Every file known to either set, with its new list. Files that only
/// appear in `previous` get an explicit empty list.
pub fn publication_plan(previous: &DiagnosticSet, next: &DiagnosticSet) -> Vec<FileDiagnostics> {
    let mut plan: BTreeMap<&Path, Vec<DiagnosticRecord>> = BTreeMap::new();
    for file in previous.files() {
        plan.insert(file, Vec::new());
    }
    for (file, diagnostics) in next.iter() {
        plan.insert(file, diagnostics.to_vec());
    }
    plan.into_iter()
        .map(|(file, diagnostics)| FileDiagnostics {
            file: file.to_path_buf(),
            diagnostics,
        })
        .collect()
}
