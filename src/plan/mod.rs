pub mod derive;
pub mod flow_plan;
pub mod graph;
pub mod joiner;
pub mod operation;
pub mod stage;

pub use derive::{derive_scope, Derivation};
pub use flow_plan::*;
pub use graph::StageGraph;
pub use joiner::Joiner;
pub use operation::*;
pub use stage::*;
