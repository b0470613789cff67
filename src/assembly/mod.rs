pub mod builder;
pub mod flow;
pub mod options;
pub mod registry;

pub use builder::{Aggregation, Assembly, Parent};
pub use flow::Flow;
pub use options::*;
pub use registry::BranchRegistry;
