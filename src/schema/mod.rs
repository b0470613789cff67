pub mod fields;
pub mod scope;
pub mod types;

pub use fields::*;
pub use scope::*;
pub use types::resolve_type;
