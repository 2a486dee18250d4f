pub mod builder;
pub mod schedule;
pub mod view;

pub use builder::GraphBuilder;
pub use schedule::{is_topological, topological_schedule};
pub use view::GraphView;
