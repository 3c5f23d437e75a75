use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;

use agenthub_core::error::{HubError, Result};
use agenthub_core::types::{MissionConfig, MissionStatus, ResultStatus, Workflow};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS missions (
        mission_id TEXT PRIMARY KEY,
        workflow TEXT NOT NULL,
        mission_text TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        started_at TEXT,
        completed_at TEXT,
        total_duration_seconds REAL
    );

    CREATE TABLE IF NOT EXISTS agent_executions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mission_id TEXT NOT NULL,
        agent_name TEXT NOT NULL,
        status TEXT NOT NULL,
        started_at TEXT NOT NULL,
        completed_at TEXT,
        duration_seconds REAL,
        result_path TEXT,
        error_message TEXT,
        FOREIGN KEY (mission_id) REFERENCES missions(mission_id)
    );

    CREATE TABLE IF NOT EXISTS mission_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        mission_id TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        level TEXT NOT NULL,
        component TEXT NOT NULL,
        message TEXT NOT NULL,
        FOREIGN KEY (mission_id) REFERENCES missions(mission_id)
    );

    CREATE INDEX IF NOT EXISTS idx_missions_status ON missions(status);
    CREATE INDEX IF NOT EXISTS idx_missions_created ON missions(created_at);
    CREATE INDEX IF NOT EXISTS idx_agent_executions_mission ON agent_executions(mission_id);
    CREATE INDEX IF NOT EXISTS idx_logs_mission ON mission_logs(mission_id);
";

/// One mission's lifecycle row.
#[derive(Debug, Clone, Serialize)]
pub struct MissionRow {
    pub mission_id: String,
    pub mission_text: String,
    pub status: String,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub total_duration_seconds: Option<f64>,
}

/// One per-node execution span.
#[derive(Debug, Clone, Serialize)]
pub struct AgentExecutionRow {
    pub id: i64,
    pub mission_id: String,
    pub agent_name: String,
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_seconds: Option<f64>,
    pub result_path: Option<String>,
    pub error_message: Option<String>,
}

/// One audit log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogRow {
    pub timestamp: String,
    pub level: String,
    pub component: String,
    pub message: String,
}

/// Full reconstructed history of one mission.
#[derive(Debug, Clone, Serialize)]
pub struct MissionHistory {
    pub mission: MissionRow,
    pub workflow: Workflow,
    pub agent_executions: Vec<AgentExecutionRow>,
    pub logs: Vec<LogRow>,
}

/// Durable, append-only mission audit store over SQLite.
///
/// The single source of truth for history: mission lifecycle rows,
/// per-node execution spans, and log entries. Rows are never mutated
/// once terminal; only status/timestamp columns of the open mission
/// row are updated until then. Each call is one transaction.
pub struct MissionStore {
    conn: Mutex<Connection>,
}

impl MissionStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HubError::Database(format!("Failed to create db directory: {}", e)))?;
        }

        let conn = Connection::open(path).map_err(|e| HubError::Database(e.to_string()))?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| HubError::Database(e.to_string()))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| HubError::Database(e.to_string()))?;

        debug!(path = %path.display(), "Mission store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| HubError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| HubError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| HubError::Database(e.to_string()))
    }

    /// Record a newly registered mission.
    pub fn record_mission_created(&self, config: &MissionConfig) -> Result<()> {
        let workflow_json = serde_json::to_string(&config.workflow)?;
        {
            let conn = self.lock_conn()?;
            conn.execute(
                "INSERT INTO missions (mission_id, workflow, mission_text, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    config.mission_id.as_str(),
                    workflow_json,
                    config.mission_text,
                    MissionStatus::Registered.as_str(),
                    config.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| HubError::Database(e.to_string()))?;
        }
        self.add_log(
            config.mission_id.as_str(),
            "INFO",
            "Hub",
            &format!("Mission {} registered", config.mission_id),
        )
    }

    /// Mark a mission as started.
    pub fn record_mission_started(&self, mission_id: &str) -> Result<()> {
        {
            let conn = self.lock_conn()?;
            conn.execute(
                "UPDATE missions SET status = 'running', started_at = ?1 WHERE mission_id = ?2",
                params![Utc::now().to_rfc3339(), mission_id],
            )
            .map_err(|e| HubError::Database(e.to_string()))?;
        }
        self.add_log(mission_id, "INFO", "Hub", "Mission execution started")
    }

    /// Mark a mission terminal, computing its total duration from the
    /// recorded start time.
    pub fn record_mission_completed(&self, mission_id: &str, status: MissionStatus) -> Result<()> {
        let completed_at = Utc::now();
        {
            let conn = self.lock_conn()?;
            let started_at: Option<String> = conn
                .query_row(
                    "SELECT started_at FROM missions WHERE mission_id = ?1",
                    params![mission_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| HubError::Database(e.to_string()))?
                .flatten();

            let duration = started_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|started| (completed_at - started.with_timezone(&Utc)).num_milliseconds() as f64 / 1000.0);

            conn.execute(
                "UPDATE missions SET status = ?1, completed_at = ?2, total_duration_seconds = ?3
                 WHERE mission_id = ?4",
                params![status.as_str(), completed_at.to_rfc3339(), duration, mission_id],
            )
            .map_err(|e| HubError::Database(e.to_string()))?;
        }
        self.add_log(
            mission_id,
            "INFO",
            "Hub",
            &format!("Mission completed with status: {}", status),
        )
    }

    /// Append one agent execution span. Appended for every callback
    /// received, duplicates included — history retains everything.
    #[allow(clippy::too_many_arguments)]
    pub fn record_agent_execution(
        &self,
        mission_id: &str,
        agent_name: &str,
        status: ResultStatus,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        result_path: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let duration = completed_at
            .map(|done| (done - started_at).num_milliseconds() as f64 / 1000.0);
        {
            let conn = self.lock_conn()?;
            conn.execute(
                "INSERT INTO agent_executions
                 (mission_id, agent_name, status, started_at, completed_at,
                  duration_seconds, result_path, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    mission_id,
                    agent_name,
                    status.as_str(),
                    started_at.to_rfc3339(),
                    completed_at.map(|t| t.to_rfc3339()),
                    duration,
                    result_path,
                    error_message,
                ],
            )
            .map_err(|e| HubError::Database(e.to_string()))?;
        }
        self.add_log(
            mission_id,
            "INFO",
            agent_name,
            &format!("Agent execution completed with status: {}", status),
        )
    }

    /// Append a log entry for a mission.
    pub fn add_log(&self, mission_id: &str, level: &str, component: &str, message: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO mission_logs (mission_id, timestamp, level, component, message)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![mission_id, Utc::now().to_rfc3339(), level, component, message],
        )
        .map_err(|e| HubError::Database(e.to_string()))?;
        Ok(())
    }

    /// Reconstruct the complete history of one mission, executions and
    /// logs ordered by timestamp. Returns None for an unknown id.
    pub fn mission_history(&self, mission_id: &str) -> Result<Option<MissionHistory>> {
        let conn = self.lock_conn()?;

        let row = conn
            .query_row(
                "SELECT mission_id, workflow, mission_text, status, created_at,
                        started_at, completed_at, total_duration_seconds
                 FROM missions WHERE mission_id = ?1",
                params![mission_id],
                |row| {
                    let workflow_json: String = row.get(1)?;
                    Ok((
                        MissionRow {
                            mission_id: row.get(0)?,
                            mission_text: row.get(2)?,
                            status: row.get(3)?,
                            created_at: row.get(4)?,
                            started_at: row.get(5)?,
                            completed_at: row.get(6)?,
                            total_duration_seconds: row.get(7)?,
                        },
                        workflow_json,
                    ))
                },
            )
            .optional()
            .map_err(|e| HubError::Database(e.to_string()))?;

        let Some((mission, workflow_json)) = row else {
            return Ok(None);
        };
        let workflow: Workflow = serde_json::from_str(&workflow_json)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, mission_id, agent_name, status, started_at, completed_at,
                        duration_seconds, result_path, error_message
                 FROM agent_executions WHERE mission_id = ?1 ORDER BY started_at",
            )
            .map_err(|e| HubError::Database(e.to_string()))?;
        let executions = stmt
            .query_map(params![mission_id], |row| {
                Ok(AgentExecutionRow {
                    id: row.get(0)?,
                    mission_id: row.get(1)?,
                    agent_name: row.get(2)?,
                    status: row.get(3)?,
                    started_at: row.get(4)?,
                    completed_at: row.get(5)?,
                    duration_seconds: row.get(6)?,
                    result_path: row.get(7)?,
                    error_message: row.get(8)?,
                })
            })
            .map_err(|e| HubError::Database(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HubError::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT timestamp, level, component, message
                 FROM mission_logs WHERE mission_id = ?1 ORDER BY timestamp",
            )
            .map_err(|e| HubError::Database(e.to_string()))?;
        let logs = stmt
            .query_map(params![mission_id], |row| {
                Ok(LogRow {
                    timestamp: row.get(0)?,
                    level: row.get(1)?,
                    component: row.get(2)?,
                    message: row.get(3)?,
                })
            })
            .map_err(|e| HubError::Database(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HubError::Database(e.to_string()))?;

        Ok(Some(MissionHistory {
            mission,
            workflow,
            agent_executions: executions,
            logs,
        }))
    }
}
