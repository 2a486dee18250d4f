// Report module
//
// Shapes the liveness and memory analyses into renderer-ready views and
// exports them.

pub mod builder;
pub mod export;
pub mod model;

pub use builder::ReportBuilder;
pub use export::{export_report, export_reports, write_report, ExportFormat};
pub use model::{MemoryReport, NodeWeightRow, PeakSummary, TensorRow, TimelineEntry};
