use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved entry sentinel. Never dispatched as an agent.
pub const START_NODE: &str = "start";
/// Reserved terminal sentinel. Reaching it concludes the mission.
pub const END_NODE: &str = "end";

/// True for the reserved `start`/`end` node identifiers.
pub fn is_sentinel(node: &str) -> bool {
    node == START_NODE || node == END_NODE
}

/// Unique mission identifier (short uuid4 prefix).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MissionId(pub String);

impl MissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string()[..8].to_string())
    }

    pub fn from_string(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed connection between two workflow nodes.
///
/// Node ids are opaque strings; `start` and `end` are sentinels.
/// An edge may carry a `when` expression evaluated against the source
/// node's result (`status == "success"`, `message contains "critical"`,
/// `!=` supported). Edges without `when` are static successors; more
/// than one static successor denotes a parallel fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

impl WorkflowEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            when: None,
        }
    }

    pub fn when(from: impl Into<String>, to: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            when: Some(expr.into()),
        }
    }
}

/// Ordered edge list as submitted by the user. Order is preserved for
/// diagram rendering; it is irrelevant for graph semantics.
pub type Workflow = Vec<WorkflowEdge>;

/// Lifecycle status of a mission. Transitions are monotonic:
/// `registered -> running -> {completed, failed, cancelled}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Registered,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported for one agent node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failed,
    Timeout,
    Error,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result of one agent's work on a mission node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent: String,
    pub status: ResultStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AgentResult {
    pub fn success(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            status: ResultStatus::Success,
            message: message.into(),
            result_path: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            status: ResultStatus::Error,
            message: message.into(),
            result_path: None,
            timestamp: Utc::now(),
        }
    }

    pub fn timeout(agent: impl Into<String>, timeout_secs: u64) -> Self {
        let agent = agent.into();
        Self {
            message: format!("No result from agent {} within {}s", agent, timeout_secs),
            agent,
            status: ResultStatus::Timeout,
            result_path: None,
            timestamp: Utc::now(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Immutable mission definition, fixed at register time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionConfig {
    pub mission_id: MissionId,
    pub workflow: Workflow,
    pub mission_text: String,
    pub created_at: DateTime<Utc>,
}

/// Mutable execution state, owned by the mission's executor task
/// while running.
#[derive(Debug, Clone, Serialize)]
pub struct MissionState {
    pub status: MissionStatus,
    pub current_node: Option<String>,
    pub results: HashMap<String, AgentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MissionState {
    pub fn registered() -> Self {
        Self {
            status: MissionStatus::Registered,
            current_node: None,
            results: HashMap::new(),
            error: None,
            started_at: None,
            completed_at: None,
        }
    }
}

/// Inbound agent callback payload reporting a node's final result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCallback {
    #[serde(rename = "missionId")]
    pub mission_id: String,
    pub agent: String,
    pub status: ResultStatus,
    pub message: String,
    #[serde(default)]
    pub result_path: Option<String>,
}

impl AgentCallback {
    /// Convert to an AgentResult stamped with the current time.
    pub fn into_result(self) -> AgentResult {
        AgentResult {
            agent: self.agent,
            status: self.status,
            message: self.message,
            result_path: self.result_path,
            timestamp: Utc::now(),
        }
    }
}
