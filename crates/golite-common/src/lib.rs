//! Shared types for the GoLite analyzer: source positions and errors.

pub mod errors;
pub mod span;

pub use errors::{AnalysisError, ErrorKind};
pub use span::{Position, Span};
