pub mod invoker;
pub mod pipeline;
pub mod scheduler;

pub use invoker::{AnalysisWorker, AnalyzerInvoker, AnalyzerLocator};
pub use pipeline::{Pipeline, ReportUpdate, Snapshot, SnapshotReader};
pub use scheduler::{DiagnosticSink, SchedulerHandle, TriggerScheduler};
