use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A node consumes a tensor that is generated later in the schedule (or never).
    #[error("Ordering violation at node {node_index} ({node}): tensor {tensor} is not generated at or before this position")]
    OrderingViolation {
        node_index: usize,
        node: String,
        tensor: String,
    },

    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Size overflow: {0}")]
    SizeOverflow(String),

    #[error("Incompatible tensor layouts: {0}")]
    IncompatibleLayout(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
