use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use agenthub_core::config::{ExecutorConfig, GatewayConfig, StorageConfig};
use agenthub_core::error::Result as HubResult;
use agenthub_core::types::MissionId;
use agenthub_engine::{
    AgentTransport, MissionExecutor, MissionRegistry, ResultCollector,
};
use agenthub_gateway::{router, AppState};
use agenthub_store::MissionStore;

/// Transport that accepts every command without a network.
struct AcceptingTransport;

impl AgentTransport for AcceptingTransport {
    fn dispatch(
        &self,
        _agent: &str,
        _mission_id: &MissionId,
        _mission_text: &str,
    ) -> BoxFuture<'_, HubResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

struct TestHub {
    app: axum::Router,
    collector: Arc<ResultCollector>,
    _tmp: tempfile::TempDir,
}

fn hub() -> TestHub {
    hub_with_token(None)
}

fn hub_with_token(token: Option<&str>) -> TestHub {
    let tmp = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        data_dir: tmp.path().to_string_lossy().into_owned(),
    };
    let registry = Arc::new(MissionRegistry::new());
    let collector = Arc::new(ResultCollector::new());
    let store = Arc::new(MissionStore::in_memory().unwrap());
    let executor = Arc::new(MissionExecutor::new(
        registry.clone(),
        collector.clone(),
        Arc::new(AcceptingTransport),
        store.clone(),
        HashMap::new(),
        &ExecutorConfig {
            node_timeout_secs: 30,
        },
    ));

    let state = Arc::new(AppState {
        config: GatewayConfig {
            bind: "127.0.0.1:0".into(),
            token: token.map(String::from),
        },
        storage,
        registry,
        executor,
        collector: collector.clone(),
        store,
    });

    TestHub {
        app: router(state),
        collector,
        _tmp: tmp,
    }
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_header(app, method, uri, body, None).await
}

async fn send_with_header(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn linear_workflow() -> Value {
    json!([
        {"from": "start", "to": "claude"},
        {"from": "claude", "to": "end"},
    ])
}

async fn register(hub: &TestHub) -> String {
    let (status, body) = send(
        &hub.app,
        "POST",
        "/api/mission/register",
        Some(json!({"workflow": linear_workflow(), "mission": "review the code"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "registered");
    body["missionId"].as_str().unwrap().to_string()
}

/// Resolve a mission's waiter for one agent once it appears.
async fn callback(hub: &TestHub, mission_id: &str, agent: &str, status: &str) {
    for _ in 0..500 {
        if hub.collector.pending_count().await > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let (code, body) = send(
        &hub.app,
        "POST",
        "/api/agent/result",
        Some(json!({
            "missionId": mission_id,
            "agent": agent,
            "status": status,
            "message": "done",
        })),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "received");
}

async fn wait_for_status(hub: &TestHub, mission_id: &str, wanted: &str) -> Value {
    for _ in 0..500 {
        let (_, body) = send(
            &hub.app,
            "GET",
            &format!("/api/mission/{}/status", mission_id),
            None,
        )
        .await;
        if body["status"] == wanted {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("mission {} never reached status {}", mission_id, wanted);
}

#[tokio::test]
async fn health_is_open() {
    let hub = hub();
    let (status, body) = send(&hub.app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_produces_id_graph_and_artifacts() {
    let hub = hub();
    let id = register(&hub).await;
    assert_eq!(id.len(), 8);

    let (status, body) = send(&hub.app, "GET", &format!("/api/mission/{}/graph", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["mermaid"],
        "graph TD\n    start --> claude\n    claude --> end\n"
    );

    let mission_dir = hub._tmp.path().join("missions").join(&id);
    assert!(mission_dir.join("config.json").exists());
    assert!(mission_dir.join("graph.mmd").exists());

    let (status, stats) = send(&hub.app, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["overall"]["total_missions"], 1);
}

#[tokio::test]
async fn register_rejects_invalid_workflow() {
    let hub = hub();
    let (status, body) = send(
        &hub.app,
        "POST",
        "/api/mission/register",
        Some(json!({
            "workflow": [{"from": "start", "to": "claude"}],
            "mission": "no way out",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Workflow must have an 'end' node");
}

#[tokio::test]
async fn unknown_mission_is_404_on_every_endpoint() {
    let hub = hub();
    for (method, uri) in [
        ("GET", "/api/mission/nope/graph"),
        ("GET", "/api/mission/nope/status"),
        ("GET", "/api/mission/nope/results"),
        ("GET", "/api/mission/nope/results/claude"),
        ("GET", "/api/mission/nope/history"),
        ("GET", "/api/mission/nope/report"),
        ("POST", "/api/mission/nope/run"),
        ("POST", "/api/mission/nope/cancel"),
    ] {
        let (status, body) = send(&hub.app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(body["detail"], "Mission not found", "{} {}", method, uri);
    }

    let (status, body) = send(
        &hub.app,
        "POST",
        "/api/agent/result",
        Some(json!({
            "missionId": "nope",
            "agent": "claude",
            "status": "success",
            "message": "done",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Mission not found");
}

#[tokio::test]
async fn run_and_callback_complete_a_mission() {
    let hub = hub();
    let id = register(&hub).await;

    let (status, body) = send(&hub.app, "POST", &format!("/api/mission/{}/run", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");

    callback(&hub, &id, "claude", "success").await;

    let final_status = wait_for_status(&hub, &id, "completed").await;
    assert_eq!(final_status["results"]["claude"]["status"], "success");
}

#[tokio::test]
async fn duplicate_callback_is_recorded_without_corrupting_state() {
    let hub = hub();
    let id = register(&hub).await;
    send(&hub.app, "POST", &format!("/api/mission/{}/run", id), None).await;

    callback(&hub, &id, "claude", "success").await;
    wait_for_status(&hub, &id, "completed").await;

    // Late duplicate after the mission has finished.
    let (status, body) = send(
        &hub.app,
        "POST",
        "/api/agent/result",
        Some(json!({
            "missionId": id,
            "agent": "claude",
            "status": "failed",
            "message": "late duplicate",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "received");

    // Terminal state untouched, history retains both callbacks.
    let (_, current) = send(&hub.app, "GET", &format!("/api/mission/{}/status", id), None).await;
    assert_eq!(current["status"], "completed");
    assert_eq!(current["results"]["claude"]["status"], "success");

    let (_, history) = send(&hub.app, "GET", &format!("/api/mission/{}/history", id), None).await;
    assert_eq!(history["agent_executions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn run_twice_is_a_conflict() {
    let hub = hub();
    let id = register(&hub).await;

    send(&hub.app, "POST", &format!("/api/mission/{}/run", id), None).await;
    let (status, body) = send(&hub.app, "POST", &format!("/api/mission/{}/run", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("expected registered"));
}

#[tokio::test]
async fn cancel_transitions_a_running_mission() {
    let hub = hub();
    let id = register(&hub).await;
    send(&hub.app, "POST", &format!("/api/mission/{}/run", id), None).await;

    // Cancel before a registered mission runs is a conflict.
    let fresh = register(&hub).await;
    let (status, _) = send(&hub.app, "POST", &format!("/api/mission/{}/cancel", fresh), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&hub.app, "POST", &format!("/api/mission/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    wait_for_status(&hub, &id, "cancelled").await;
}

#[tokio::test]
async fn result_content_is_served_from_result_path() {
    let hub = hub();
    let id = register(&hub).await;
    send(&hub.app, "POST", &format!("/api/mission/{}/run", id), None).await;

    let result_file = hub._tmp.path().join("claude_output.md");
    std::fs::write(&result_file, "## Findings\nall clear\n").unwrap();

    for _ in 0..500 {
        if hub.collector.pending_count().await > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    send(
        &hub.app,
        "POST",
        "/api/agent/result",
        Some(json!({
            "missionId": id,
            "agent": "claude",
            "status": "success",
            "message": "done",
            "result_path": result_file.to_string_lossy(),
        })),
    )
    .await;
    wait_for_status(&hub, &id, "completed").await;

    let (status, body) = send(
        &hub.app,
        "GET",
        &format!("/api/mission/{}/results/claude", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "## Findings\nall clear\n");

    let (status, all) = send(&hub.app, "GET", &format!("/api/mission/{}/results", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["results"]["claude"]["content"], "## Findings\nall clear\n");

    let (status, body) = send(
        &hub.app,
        "GET",
        &format!("/api/mission/{}/results/ghost", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No results from agent ghost");
}

#[tokio::test]
async fn mission_listing_filters_and_limits() {
    let hub = hub();
    register(&hub).await;
    register(&hub).await;

    let (status, body) = send(&hub.app, "GET", "/api/missions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["missions"].as_array().unwrap().len(), 2);

    let (_, body) = send(&hub.app, "GET", "/api/missions?limit=1", None).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["missions"].as_array().unwrap().len(), 1);

    let (_, body) = send(&hub.app, "GET", "/api/missions?status=running", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn report_renders_markdown() {
    let hub = hub();
    let id = register(&hub).await;

    let (status, body) = send(&hub.app, "GET", &format!("/api/mission/{}/report", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let content = body["content"].as_str().unwrap();
    assert!(content.starts_with(&format!("# Mission Report: {}", id)));
    assert!(content.contains("## Workflow"));
    assert!(hub
        ._tmp
        .path()
        .join("missions")
        .join(&id)
        .join("report.md")
        .exists());
}

#[tokio::test]
async fn bearer_token_gates_the_api_but_not_health() {
    let hub = hub_with_token(Some("hub-secret"));

    let (status, _) = send(&hub.app, "GET", "/api/missions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send_with_header(&hub.app, "GET", "/api/missions", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send_with_header(&hub.app, "GET", "/api/missions", None, Some("hub-secret")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&hub.app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
