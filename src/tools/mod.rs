// tools module
//
// Numeric helpers for checking computed tensors in tests and benches.

pub mod comparison;
pub mod random;

pub use comparison::{
    all_close,
    all_close_all,
    all_close_tensors,
    compare_values,
    CorrectnessMetrics,
    TensorView,
    DEFAULT_ATOL,
    DEFAULT_RTOL,
};
pub use random::Uniform;
