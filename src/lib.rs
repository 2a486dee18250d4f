pub mod error;
pub mod model;
pub mod ops;
pub mod graph;
pub mod memory;
pub mod report;
pub mod options;
pub mod pass;
pub mod layout;
pub mod tools;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{DataType, Graph, Node, NodeId, TensorDescriptor, TensorId, TensorType};
pub use ops::{Op, OpKind, OpRegistry};
pub use graph::{GraphBuilder, GraphView};
pub use memory::{LivenessAnalysis, MemoryAnalyzer, MemoryProfile, TensorLifetime};
pub use report::{export_report, write_report, ExportFormat, MemoryReport, ReportBuilder};
pub use options::AnalysisOptions;
pub use pass::{analyze, AnalysisPass, MemoryReportPass, PassResult};
