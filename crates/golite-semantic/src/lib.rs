//! Semantic front end for the GoLite language.
//!
//! Takes a parsed [`ast::Program`] (built programmatically or deserialized
//! from JSON) and validates it: weeding, symbol resolution, and type
//! checking, in that order. See [`semantic::analyze`] for the entry point.

pub mod ast;
pub mod semantic;

pub use semantic::{analyze, weed, Analysis, AnalysisConfig};
