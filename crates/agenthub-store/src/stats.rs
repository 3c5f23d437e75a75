use rusqlite::params;
use serde::Serialize;

use agenthub_core::error::{HubError, Result};

use crate::store::MissionStore;

/// Counts by status plus average completed-mission duration.
#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub total_missions: i64,
    pub completed: i64,
    pub failed: i64,
    pub running: i64,
    pub avg_duration: Option<f64>,
}

/// Per-agent execution totals.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStats {
    pub agent_name: String,
    pub total_executions: i64,
    pub successful: i64,
    pub avg_duration: Option<f64>,
}

/// Compact mission row for the recent-missions listing.
#[derive(Debug, Clone, Serialize)]
pub struct RecentMission {
    pub mission_id: String,
    pub mission_text: String,
    pub status: String,
    pub created_at: String,
    pub total_duration_seconds: Option<f64>,
}

/// Aggregate statistics, computed at read time. Low-volume
/// control-plane data; no caching.
#[derive(Debug, Clone, Serialize)]
pub struct MissionStats {
    pub overall: OverallStats,
    pub by_agent: Vec<AgentStats>,
    pub recent_missions: Vec<RecentMission>,
}

impl MissionStore {
    /// Aggregate counts, per-agent averages, and the most recent
    /// missions (newest first, bounded by `limit`).
    pub fn mission_stats(&self, limit: usize) -> Result<MissionStats> {
        let conn = self.lock_conn()?;

        let overall = conn
            .query_row(
                "SELECT
                    COUNT(*),
                    COUNT(CASE WHEN status = 'completed' THEN 1 END),
                    COUNT(CASE WHEN status = 'failed' THEN 1 END),
                    COUNT(CASE WHEN status = 'running' THEN 1 END),
                    AVG(CASE WHEN status = 'completed' THEN total_duration_seconds END)
                 FROM missions",
                [],
                |row| {
                    Ok(OverallStats {
                        total_missions: row.get(0)?,
                        completed: row.get(1)?,
                        failed: row.get(2)?,
                        running: row.get(3)?,
                        avg_duration: row.get(4)?,
                    })
                },
            )
            .map_err(|e| HubError::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT
                    agent_name,
                    COUNT(*),
                    COUNT(CASE WHEN status = 'success' THEN 1 END),
                    AVG(duration_seconds)
                 FROM agent_executions
                 GROUP BY agent_name
                 ORDER BY agent_name",
            )
            .map_err(|e| HubError::Database(e.to_string()))?;
        let by_agent = stmt
            .query_map([], |row| {
                Ok(AgentStats {
                    agent_name: row.get(0)?,
                    total_executions: row.get(1)?,
                    successful: row.get(2)?,
                    avg_duration: row.get(3)?,
                })
            })
            .map_err(|e| HubError::Database(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HubError::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT mission_id, mission_text, status, created_at, total_duration_seconds
                 FROM missions
                 ORDER BY created_at DESC
                 LIMIT ?1",
            )
            .map_err(|e| HubError::Database(e.to_string()))?;
        let recent_missions = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RecentMission {
                    mission_id: row.get(0)?,
                    mission_text: row.get(1)?,
                    status: row.get(2)?,
                    created_at: row.get(3)?,
                    total_duration_seconds: row.get(4)?,
                })
            })
            .map_err(|e| HubError::Database(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HubError::Database(e.to_string()))?;

        Ok(MissionStats {
            overall,
            by_agent,
            recent_missions,
        })
    }
}
