use crate::index::{FunctionSummary, ResultIndex};
use crate::model::UsageSite;
use crate::runtime::SnapshotReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverContent {
    pub markdown: String,
}

#[derive(Clone)]
pub struct HoverProvider {
    reader: SnapshotReader,
}

impl HoverProvider {
    pub fn new(reader: SnapshotReader) -> Self {
        Self { reader }
    }

    /// `line` is 1-based; `word` is the identifier under the cursor.
    pub fn hover_at(&self, file: &Path, line: u32, word: &str) -> Option<HoverContent> {
        hover_from_index(&self.reader.current().index, file, line, word)
    }
}

pub fn hover_from_index(
    index: &ResultIndex,
    file: &Path,
    line: u32,
    word: &str,
) -> Option<HoverContent> {
    let summary = index.lookup(file, line)?;
    if summary.name != word {
        // The buffer moved on since the last analysis.
        tracing::trace!(
            "stale hover at {}:{}: indexed `{}`, cursor on `{}`",
            file.display(),
            line,
            summary.name,
            word
        );
        return None;
    }
    Some(HoverContent {
        markdown: render(summary),
    })
}

fn render(summary: &FunctionSummary) -> String {
    let defined = location(&summary.file, summary.line);
    if summary.usage_count == 0 {
        return format!("**{}** is unused, defined at `{}`", summary.name, defined);
    }

    let times = if summary.usage_count == 1 { "time" } else { "times" };
    let mut text = format!(
        "**{}** used {} {}, defined at `{}`",
        summary.name, summary.usage_count, times, defined
    );
    if let Some(UsageSite { file, line }) = &summary.last_used {
        text.push_str(&format!(", last used at `{}`", location(file, *line)));
    }
    text
}

fn location(file: &Path, line: u32) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| file.to_string_lossy());
    format!("{}:{}", name, line)
}
