pub mod builder;
pub mod nodes;

pub use builder::Builder;
pub use nodes::*;
