use crate::error::InvocationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One complete analyzer output. Replaced wholesale on every successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Older analyzers name this list `unused_functions` even though it
    /// carries every definition.
    #[serde(alias = "unused_functions")]
    pub functions: Vec<FunctionRecord>,
    #[serde(default)]
    pub commented_code: Vec<CommentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub file: PathBuf,
    /// 1-based.
    pub line: u32,
    pub usage_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<UsageSite>,
}

impl FunctionRecord {
    pub fn is_unused(&self) -> bool {
        self.usage_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageSite {
    pub file: PathBuf,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub file: PathBuf,
    pub line: u32,
    #[serde(default)]
    pub content: String,
}

impl AnalysisReport {
    pub fn unused_functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.functions.iter().filter(|f| f.is_unused())
    }

    pub fn unused_functions_in<'a>(
        &'a self,
        file: &'a Path,
    ) -> impl Iterator<Item = &'a FunctionRecord> + 'a {
        self.unused_functions().filter(move |f| f.file == file)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.commented_code.is_empty()
    }
}

/// Decodes the analyzer's standard output into a validated report.
///
/// Rejects anything that is not a single JSON object with a `functions` list,
/// error objects of the form `{"error": "..."}`, and zero line numbers. A
/// `last_used` site on a record with `usage_count == 0` is discarded.
pub fn decode_report(stdout: &[u8]) -> Result<AnalysisReport, InvocationError> {
    let value: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| InvocationError::MalformedReport(format!("invalid JSON: {}", e)))?;

    if let Some(message) = reported_error(&value) {
        return Err(InvocationError::MalformedReport(format!(
            "analyzer reported an error: {}",
            message
        )));
    }

    let mut report: AnalysisReport = serde_json::from_value(value)
        .map_err(|e| InvocationError::MalformedReport(e.to_string()))?;

    validate(&report)?;
    normalize(&mut report);
    Ok(report)
}

fn reported_error(value: &serde_json::Value) -> Option<String> {
    let object = value.as_object()?;
    if object.contains_key("functions") || object.contains_key("unused_functions") {
        return None;
    }
    object.get("error").map(|e| match e.as_str() {
        Some(s) => s.to_string(),
        None => e.to_string(),
    })
}

fn validate(report: &AnalysisReport) -> Result<(), InvocationError> {
    for f in &report.functions {
        if f.line == 0 {
            return Err(zero_line("function", &f.file, Some(&f.name)));
        }
        if let Some(site) = &f.last_used {
            if site.line == 0 {
                return Err(zero_line("last use of", &site.file, Some(&f.name)));
            }
        }
    }
    for c in &report.commented_code {
        if c.line == 0 {
            return Err(zero_line("commented code", &c.file, None));
        }
    }
    Ok(())
}

fn zero_line(what: &str, file: &Path, name: Option<&str>) -> InvocationError {
    let subject = match name {
        Some(name) => format!("{} `{}`", what, name),
        None => what.to_string(),
    };
    InvocationError::MalformedReport(format!(
        "{} in {} has line 0 (lines are 1-based)",
        subject,
        file.display()
    ))
}

fn normalize(report: &mut AnalysisReport) {
    for f in &mut report.functions {
        if f.usage_count == 0 && f.last_used.take().is_some() {
            tracing::debug!(
                "dropping last_used on unused function {} ({}:{})",
                f.name,
                f.file.display(),
                f.line
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Result<AnalysisReport, InvocationError> {
        decode_report(s.as_bytes())
    }

    #[test]
    fn decodes_full_report() {
        let report = decode(
            r##"{
                "functions": [
                    {"name": "foo", "file": "/w/a.py", "line": 10, "usage_count": 0},
                    {"name": "bar", "file": "/w/a.py", "line": 5, "usage_count": 3,
                     "last_used": {"file": "/w/b.py", "line": 42}}
                ],
                "commented_code": [
                    {"file": "/w/a.py", "line": 2, "content": "# def old():"}
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(report.functions.len(), 2);
        assert_eq!(report.functions[0].name, "foo");
        assert!(report.functions[0].last_used.is_none());
        assert_eq!(
            report.functions[1].last_used,
            Some(UsageSite {
                file: PathBuf::from("/w/b.py"),
                line: 42
            })
        );
        assert_eq!(report.commented_code[0].content, "# def old():");
    }

    #[test]
    fn accepts_legacy_key_and_ignores_unknown_fields() {
        let report = decode(
            r#"{"unused_functions": [{"name": "f", "file": "a.py", "line": 1, "usage_count": 0}],
                "unused_imports": [],
                "commented_code": []}"#,
        )
        .unwrap();
        assert_eq!(report.functions.len(), 1);
    }

    #[test]
    fn commented_code_defaults_to_empty() {
        let report = decode(r#"{"functions": []}"#).unwrap();
        assert!(report.commented_code.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn rejects_non_json() {
        let err = decode("not json").unwrap_err();
        assert!(matches!(err, InvocationError::MalformedReport(_)));
    }

    #[test]
    fn rejects_missing_functions() {
        let err = decode(r#"{"commented_code": []}"#).unwrap_err();
        match err {
            InvocationError::MalformedReport(msg) => assert!(msg.contains("functions")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_analyzer_error_object() {
        let err = decode(r#"{"error": "No path provided"}"#).unwrap_err();
        match err {
            InvocationError::MalformedReport(msg) => assert!(msg.contains("No path provided")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_zero_lines() {
        let err = decode(
            r#"{"functions": [{"name": "f", "file": "a.py", "line": 0, "usage_count": 0}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, InvocationError::MalformedReport(_)));

        let err = decode(r#"{"functions": [], "commented_code": [{"file": "a.py", "line": 0, "content": ""}]}"#)
            .unwrap_err();
        assert!(matches!(err, InvocationError::MalformedReport(_)));
    }

    #[test]
    fn rejects_negative_usage_count() {
        let err = decode(
            r#"{"functions": [{"name": "f", "file": "a.py", "line": 3, "usage_count": -1}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, InvocationError::MalformedReport(_)));
    }

    #[test]
    fn drops_last_used_on_unused_function() {
        let report = decode(
            r#"{"functions": [{"name": "f", "file": "a.py", "line": 3, "usage_count": 0,
                 "last_used": {"file": "b.py", "line": 9}}]}"#,
        )
        .unwrap();
        assert!(report.functions[0].last_used.is_none());
    }

    #[test]
    fn unused_functions_in_filters_by_file() {
        let report = decode(
            r#"{"functions": [
                {"name": "a", "file": "x.py", "line": 1, "usage_count": 0},
                {"name": "b", "file": "y.py", "line": 1, "usage_count": 0},
                {"name": "c", "file": "x.py", "line": 4, "usage_count": 2}
            ]}"#,
        )
        .unwrap();
        let names: Vec<_> = report
            .unused_functions_in(Path::new("x.py"))
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["a"]);
    }
}
