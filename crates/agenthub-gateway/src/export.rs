use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde_json::json;

use agenthub_core::config::StorageConfig;
use agenthub_core::error::Result;
use agenthub_core::types::AgentResult;
use agenthub_engine::MissionEntry;

/// Per-mission export directory artifacts. These files are derived
/// views for operators; the store remains the single source of truth.
///
/// Write the mission's `config.json` and `graph.mmd` at register time.
pub fn write_registration(storage: &StorageConfig, entry: &MissionEntry) -> Result<()> {
    let dir = storage.mission_dir(entry.config.mission_id.as_str());
    fs::create_dir_all(&dir)?;

    let config = json!({
        "missionId": entry.config.mission_id.as_str(),
        "workflow": entry.config.workflow,
        "mission": entry.config.mission_text,
        "status": "registered",
        "created_at": entry.config.created_at.to_rfc3339(),
    });
    fs::write(dir.join("config.json"), serde_json::to_string_pretty(&config)?)?;
    fs::write(dir.join("graph.mmd"), &entry.mermaid)?;
    Ok(())
}

/// Refresh `results.json` with the latest per-agent results.
pub fn write_results_snapshot(
    storage: &StorageConfig,
    mission_id: &str,
    results: &HashMap<String, AgentResult>,
) -> Result<()> {
    let dir = storage.mission_dir(mission_id);
    fs::create_dir_all(&dir)?;
    fs::write(
        dir.join("results.json"),
        serde_json::to_string_pretty(results)?,
    )?;
    Ok(())
}

/// Write the rendered markdown report, returning its path.
pub fn write_report(storage: &StorageConfig, mission_id: &str, content: &str) -> Result<PathBuf> {
    let dir = storage.mission_dir(mission_id);
    fs::create_dir_all(&dir)?;
    let path = dir.join("report.md");
    fs::write(&path, content)?;
    Ok(path)
}
