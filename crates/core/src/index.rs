//! Point-lookup index over function definitions, keyed by `(file, line)`.

use crate::model::{AnalysisReport, UsageSite};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSummary {
    pub name: String,
    pub file: PathBuf,
    pub line: u32,
    pub usage_count: u32,
    pub last_used: Option<UsageSite>,
}

#[derive(Debug, Clone, Default)]
pub struct ResultIndex {
    entries: HashMap<PathBuf, HashMap<u32, FunctionSummary>>,
}

impl ResultIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_report(report: &AnalysisReport) -> Self {
        let mut index = Self::new();
        index.rebuild(report);
        index
    }

    /// Drops every entry and repopulates from `report.functions` in order;
    /// a later record with the same `(file, line)` replaces an earlier one.
    pub fn rebuild(&mut self, report: &AnalysisReport) {
        self.entries.clear();
        for f in &report.functions {
            self.entries.entry(f.file.clone()).or_default().insert(
                f.line,
                FunctionSummary {
                    name: f.name.clone(),
                    file: f.file.clone(),
                    line: f.line,
                    usage_count: f.usage_count,
                    last_used: f.last_used.clone(),
                },
            );
        }
    }

    pub fn lookup(&self, file: &Path, line: u32) -> Option<&FunctionSummary> {
        self.entries.get(file)?.get(&line)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
