pub mod analyzer;
pub mod liveness;

#[cfg(test)]
pub(crate) mod testing;

pub use liveness::{
    LivenessAnalysis,
    NodeLiveness,
    TensorLifetime,
};

pub use analyzer::{
    MemoryAnalyzer,
    MemoryProfile,
    NodeMemory,
    PeakNode,
    NORMALIZATION_FLOOR,
};
