pub mod report;

pub use report::{AnalysisReport, CommentRecord, FunctionRecord, UsageSite, decode_report};
