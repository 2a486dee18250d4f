pub mod op;
pub mod registry;

pub use op::{Op, OpKind};
pub use registry::{OpDescriptor, OpHandle, OpRegistry};
