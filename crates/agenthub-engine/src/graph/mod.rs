//! Pure workflow-graph functions: structural validation, compilation
//! into a transition table, and Mermaid diagram rendering. Nothing in
//! this module performs I/O.

pub mod compile;
pub mod mermaid;
pub mod validate;

pub use compile::{compile, evaluate_condition, CompiledGraph, Route};
pub use mermaid::mermaid_diagram;
pub use validate::validate;
