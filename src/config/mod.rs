/// Configuration management
pub mod builder;

pub use builder::*;
