use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use agenthub_core::error::HubError;
use agenthub_core::types::{AgentCallback, MissionStatus, Workflow};
use agenthub_store::render_report;

use crate::error::ApiError;
use crate::export;
use crate::middleware::Authenticated;
use crate::state::AppState;

type ApiResult = Result<Json<Value>, ApiError>;

// GET /api/health — no auth required
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Deserialize)]
pub struct RegisterBody {
    pub workflow: Workflow,
    pub mission: String,
}

// POST /api/mission/register
pub async fn register_mission(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> ApiResult {
    let entry = state.executor.register(body.workflow, body.mission).await?;
    export::write_registration(&state.storage, &entry)?;

    Ok(Json(json!({
        "missionId": entry.config.mission_id.as_str(),
        "status": "registered",
    })))
}

// GET /api/mission/{id}/graph
pub async fn mission_graph(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let entry = state
        .registry
        .get(&id)
        .await
        .ok_or_else(ApiError::mission_not_found)?;
    Ok(Json(json!({ "mermaid": entry.mermaid })))
}

// POST /api/mission/{id}/run
pub async fn run_mission(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.executor.run(&id).await?;
    Ok(Json(json!({
        "missionId": id,
        "status": "running",
    })))
}

// POST /api/mission/{id}/cancel
pub async fn cancel_mission(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.executor.cancel(&id).await?;
    Ok(Json(json!({
        "missionId": id,
        "status": "cancelled",
    })))
}

// GET /api/mission/{id}/status
pub async fn mission_status(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let entry = state
        .registry
        .get(&id)
        .await
        .ok_or_else(ApiError::mission_not_found)?;
    let snapshot = entry.snapshot().await;

    let mut body = json!({
        "missionId": id,
        "status": snapshot.status,
        "current_agent": snapshot.current_node,
        "results": snapshot.results,
    });
    if let Some(error) = snapshot.error {
        body["error"] = json!(error);
    }
    Ok(Json(body))
}

// POST /api/agent/result
//
// Every callback received is appended to history, duplicates included.
// A waiter, if pending, is resolved; otherwise the live result map is
// overwritten directly (latest write wins). Callbacks for a mission no
// longer running are recorded for audit without touching its state.
pub async fn receive_agent_result(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Json(callback): Json<AgentCallback>,
) -> ApiResult {
    let mission_id = callback.mission_id.clone();
    let entry = state
        .registry
        .get(&mission_id)
        .await
        .ok_or_else(ApiError::mission_not_found)?;

    let result = callback.into_result();
    info!(
        mission_id,
        agent = %result.agent,
        status = %result.status,
        "Agent result received"
    );

    let error_message = (!result.succeeded()).then(|| result.message.clone());
    if let Err(e) = state.store.record_agent_execution(
        &mission_id,
        &result.agent,
        result.status,
        result.timestamp,
        Some(Utc::now()),
        result.result_path.as_deref(),
        error_message.as_deref(),
    ) {
        warn!(error = %e, "Failed to record agent callback");
    }

    if entry.status().await == MissionStatus::Running {
        let delivered = state
            .collector
            .resolve(&mission_id, &result.agent, result.clone())
            .await;
        if !delivered {
            entry
                .state
                .write()
                .await
                .results
                .insert(result.agent.clone(), result.clone());
        }

        let mut results = entry.snapshot().await.results;
        results.insert(result.agent.clone(), result);
        if let Err(e) = export::write_results_snapshot(&state.storage, &mission_id, &results) {
            warn!(error = %e, "Failed to write results snapshot");
        }
    }

    Ok(Json(json!({ "status": "received" })))
}

// GET /api/mission/{id}/results/{agent}
pub async fn agent_result(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Path((id, agent)): Path<(String, String)>,
) -> ApiResult {
    let entry = state
        .registry
        .get(&id)
        .await
        .ok_or_else(ApiError::mission_not_found)?;
    let snapshot = entry.snapshot().await;
    let result = snapshot
        .results
        .get(&agent)
        .ok_or_else(|| ApiError::not_found(format!("No results from agent {}", agent)))?;

    match result.result_path.as_deref() {
        Some(path) if std::path::Path::new(path).exists() => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ApiError::from(HubError::ReportExport(format!(
                    "Error reading result file: {}",
                    e
                )))
            })?;
            Ok(Json(json!({
                "agent": agent,
                "status": result.status,
                "message": result.message,
                "timestamp": result.timestamp,
                "content": content,
            })))
        }
        _ => Ok(Json(json!({
            "agent": agent,
            "status": result.status,
            "message": result.message,
            "content": "Result file not found",
        }))),
    }
}

// GET /api/mission/{id}/results
pub async fn all_results(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let entry = state
        .registry
        .get(&id)
        .await
        .ok_or_else(ApiError::mission_not_found)?;
    let snapshot = entry.snapshot().await;

    let mut results = serde_json::Map::new();
    for (agent, result) in &snapshot.results {
        let content = match result.result_path.as_deref() {
            Some(path) if std::path::Path::new(path).exists() => {
                std::fs::read_to_string(path)
                    .unwrap_or_else(|_| "Error reading result file".to_string())
            }
            _ => "No content available".to_string(),
        };
        results.insert(
            agent.clone(),
            json!({
                "status": result.status,
                "message": result.message,
                "timestamp": result.timestamp,
                "content": content,
            }),
        );
    }

    Ok(Json(json!({
        "missionId": id,
        "status": snapshot.status,
        "results": results,
    })))
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    10
}

// GET /api/missions?status=&limit=
pub async fn list_missions(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> ApiResult {
    let mut missions = Vec::new();
    for entry in state.registry.list().await {
        let snapshot = entry.snapshot().await;
        if let Some(ref wanted) = q.status {
            if snapshot.status.as_str() != wanted {
                continue;
            }
        }
        missions.push(json!({
            "missionId": entry.config.mission_id.as_str(),
            "status": snapshot.status,
            "mission": summarize(&entry.config.mission_text),
            "created_at": entry.config.created_at,
            "current_agent": snapshot.current_node,
            "agent_count": snapshot.results.len(),
        }));
    }

    let total = missions.len();
    missions.truncate(q.limit);
    Ok(Json(json!({
        "total": total,
        "missions": missions,
    })))
}

/// First 100 characters of the mission text for listings.
fn summarize(mission_text: &str) -> String {
    let mut summary: String = mission_text.chars().take(100).collect();
    if summary.len() < mission_text.len() {
        summary.push_str("...");
    }
    summary
}

// GET /api/mission/{id}/history
pub async fn mission_history(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let history = state
        .store
        .mission_history(&id)?
        .ok_or_else(ApiError::mission_not_found)?;
    Ok(Json(serde_json::to_value(&history).map_err(HubError::from)?))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_stats_limit")]
    pub limit: usize,
}

fn default_stats_limit() -> usize {
    100
}

// GET /api/stats?limit=
pub async fn stats(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Query(q): Query<StatsQuery>,
) -> ApiResult {
    let stats = state.store.mission_stats(q.limit)?;
    Ok(Json(serde_json::to_value(&stats).map_err(HubError::from)?))
}

// GET /api/mission/{id}/report
pub async fn mission_report(
    _: Authenticated,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let history = state
        .store
        .mission_history(&id)?
        .ok_or_else(ApiError::mission_not_found)?;
    let content = render_report(&history);
    let path = export::write_report(&state.storage, &id, &content)?;

    Ok(Json(json!({
        "missionId": id,
        "report_path": path.display().to_string(),
        "content": content,
    })))
}
