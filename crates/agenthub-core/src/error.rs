use thiserror::Error;

/// Structural problems in a submitted workflow.
///
/// These always map to a 400 at the register boundary and never
/// mutate any state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Workflow must contain at least one edge")]
    EmptyWorkflow,

    #[error("Workflow must have a 'start' node")]
    MissingStartNode,

    #[error("Workflow must have an 'end' node")]
    MissingEndNode,

    #[error("Workflow contains a cycle: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },
}

#[derive(Debug, Error)]
pub enum HubError {
    // Workflow errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // Mission errors
    #[error("Mission not found: {0}")]
    MissionNotFound(String),

    #[error("Mission {mission_id} is {status}, expected {expected}")]
    InvalidMissionState {
        mission_id: String,
        status: String,
        expected: String,
    },

    // Dispatch errors
    #[error("Agent not registered: {0}")]
    AgentNotRegistered(String),

    #[error("Dispatch to agent {agent} failed: {message}")]
    Dispatch { agent: String, message: String },

    #[error("Dispatch to agent {agent} rejected: {reason}")]
    DispatchRejected { agent: String, reason: String },

    #[error("No result from agent {agent} within {timeout_secs}s")]
    ResultTimeout { agent: String, timeout_secs: u64 },

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Report export failed: {0}")]
    ReportExport(String),

    // Gateway errors
    #[error("Gateway error: {0}")]
    Gateway(String),

    // Executor errors
    #[error("Internal error: {0}")]
    Internal(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HubError>;
