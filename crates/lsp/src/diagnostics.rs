use dcf_core::reconcile::{DiagnosticRecord, Severity};
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};

pub const DIAGNOSTIC_SOURCE: &str = "dcf";

/// Zero-based range covering the whole of 1-based `line`: from its first
/// column to the start of the next line.
pub fn line_range(line: u32) -> Range {
    let zero_based = line.saturating_sub(1);
    Range::new(Position::new(zero_based, 0), Position::new(zero_based + 1, 0))
}

pub fn to_lsp_diagnostic(record: &DiagnosticRecord) -> Diagnostic {
    Diagnostic {
        range: line_range(record.line),
        severity: Some(match record.severity {
            Severity::Warning => DiagnosticSeverity::WARNING,
            Severity::Hint => DiagnosticSeverity::HINT,
        }),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: record.message.clone(),
        ..Default::default()
    }
}
