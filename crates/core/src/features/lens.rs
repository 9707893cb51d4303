use crate::model::AnalysisReport;
use crate::reconcile::UNUSED_FUNCTION_MESSAGE;
use crate::runtime::SnapshotReader;
use std::path::Path;

/// Informational annotation above an unused definition. Carries no command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LensMarker {
    /// 1-based definition line.
    pub line: u32,
    pub title: String,
}

#[derive(Clone)]
pub struct LensProvider {
    reader: SnapshotReader,
}

impl LensProvider {
    pub fn new(reader: SnapshotReader) -> Self {
        Self { reader }
    }

    pub fn lenses_for(&self, file: &Path) -> Vec<LensMarker> {
        lenses_in(&self.reader.current().report, file)
    }

    /// Fires once per successful refresh; failed runs never signal.
    pub fn on_report_updated(&self) -> ReportUpdates {
        ReportUpdates {
            reader: self.reader.clone(),
        }
    }
}

/// Stream of report generations for hosts that re-query lenses.
pub struct ReportUpdates {
    reader: SnapshotReader,
}

impl ReportUpdates {
    pub async fn next(&mut self) -> Option<u64> {
        self.reader.changed().await
    }
}

pub fn lenses_in(report: &AnalysisReport, file: &Path) -> Vec<LensMarker> {
    report
        .unused_functions_in(file)
        .map(|f| LensMarker {
            line: f.line,
            title: UNUSED_FUNCTION_MESSAGE.to_string(),
        })
        .collect()
}
