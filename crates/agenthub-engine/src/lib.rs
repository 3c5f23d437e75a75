//! Mission Workflow Orchestration Engine.
//!
//! A mission is a free-text task dispatched across a chain of external
//! worker agents according to a user-supplied directed workflow. The
//! engine validates the workflow, compiles it into an executable
//! transition table, and runs one independent task per mission that
//! walks the graph: dispatch a command to the node's agent, suspend on
//! a waiter until the agent's asynchronous result callback arrives,
//! then follow the matching edges. Fan-out branches run concurrently
//! and reconverging nodes join on all of their live predecessors.

pub mod collector;
pub mod dispatcher;
pub mod executor;
pub mod graph;
pub mod registry;

pub use collector::ResultCollector;
pub use dispatcher::{AgentTransport, HttpDispatcher};
pub use executor::MissionExecutor;
pub use graph::{compile, mermaid_diagram, validate, CompiledGraph};
pub use registry::{MissionEntry, MissionRegistry};
