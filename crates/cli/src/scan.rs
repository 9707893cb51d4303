use dcf_core::DcfConfig;
use dcf_core::reconcile::{DiagnosticSet, Severity};
use dcf_core::runtime::{AnalyzerInvoker, Pipeline};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub async fn run(path: PathBuf, config: DcfConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let worker = Arc::new(AnalyzerInvoker::from_config(&config.analyzer));
    let pipeline = Pipeline::new(worker, path.clone(), config.diagnostics.clone());

    info!("Analyzing {}...", path.display());
    let update = pipeline.refresh().await?;
    let snapshot = &update.snapshot;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.diagnostics)?);
    } else {
        print!("{}", render_text(&snapshot.diagnostics));
        info!(
            "{} functions analyzed, {} unused, {} commented-out blocks",
            snapshot.report.functions.len(),
            snapshot.report.unused_functions().count(),
            snapshot.report.commented_code.len()
        );
    }
    Ok(())
}

/// `file:line: severity: message`, one finding per line.
pub fn render_text(diagnostics: &DiagnosticSet) -> String {
    let mut out = String::new();
    for (file, records) in diagnostics.iter() {
        for record in records {
            let severity = match record.severity {
                Severity::Warning => "warning",
                Severity::Hint => "hint",
            };
            let _ = writeln!(
                out,
                "{}:{}: {}: {}",
                file.display(),
                record.line,
                severity,
                record.message
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcf_core::config::DiagnosticsConfig;
    use dcf_core::model::{AnalysisReport, CommentRecord, FunctionRecord};
    use dcf_core::reconcile::reconcile;

    #[test]
    fn renders_one_line_per_finding() {
        let report = AnalysisReport {
            functions: vec![FunctionRecord {
                name: "foo".into(),
                file: PathBuf::from("a.py"),
                line: 10,
                usage_count: 0,
                last_used: None,
            }],
            commented_code: vec![CommentRecord {
                file: PathBuf::from("b.py"),
                line: 3,
                content: "# return x".into(),
            }],
        };
        let text = render_text(&reconcile(&report, &DiagnosticsConfig::default()));
        assert_eq!(
            text,
            "a.py:10: warning: Unused function\nb.py:3: hint: Commented-out code: # return x\n"
        );
    }
}
