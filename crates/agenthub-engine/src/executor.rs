use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use agenthub_core::config::{AgentEndpoint, ExecutorConfig};
use agenthub_core::error::{HubError, Result};
use agenthub_core::types::{
    AgentResult, MissionConfig, MissionId, MissionStatus, Workflow, END_NODE,
};
use agenthub_store::MissionStore;

use crate::collector::ResultCollector;
use crate::dispatcher::AgentTransport;
use crate::graph::{compile, mermaid_diagram, validate, CompiledGraph};
use crate::registry::{MissionEntry, MissionRegistry};

/// Orchestrates missions: registration, per-mission execution tasks,
/// and cancellation.
///
/// Each running mission is one spawned task walking the compiled
/// graph. For every agent node the task registers a waiter, dispatches
/// the command, and suspends until the agent's callback resolves the
/// waiter or the per-node timeout elapses. Fan-out branches run as
/// concurrent sub-tasks in a JoinSet; a reconverging node joins on all
/// of its live inbound branches. Nothing escapes the task boundary:
/// a panicking or erroring node fails its own mission only.
pub struct MissionExecutor {
    registry: Arc<MissionRegistry>,
    collector: Arc<ResultCollector>,
    transport: Arc<dyn AgentTransport>,
    store: Arc<MissionStore>,
    agents: Arc<HashMap<String, AgentEndpoint>>,
    node_timeout: Duration,
}

/// Shared handles a mission task needs, detached from the executor.
struct RunContext {
    collector: Arc<ResultCollector>,
    transport: Arc<dyn AgentTransport>,
    store: Arc<MissionStore>,
    agents: Arc<HashMap<String, AgentEndpoint>>,
    node_timeout: Duration,
}

enum Outcome {
    Completed,
    Cancelled,
    Failed(String),
}

struct NodeOutcome {
    node: String,
    result: AgentResult,
    started_at: DateTime<Utc>,
    /// True when the engine produced the result itself (dispatch
    /// failure or timeout) and must record it; callback-delivered
    /// results are recorded at the HTTP boundary.
    synthesized: bool,
}

impl MissionExecutor {
    pub fn new(
        registry: Arc<MissionRegistry>,
        collector: Arc<ResultCollector>,
        transport: Arc<dyn AgentTransport>,
        store: Arc<MissionStore>,
        agents: HashMap<String, AgentEndpoint>,
        config: &ExecutorConfig,
    ) -> Self {
        Self {
            registry,
            collector,
            transport,
            store,
            agents: Arc::new(agents),
            node_timeout: Duration::from_secs(config.node_timeout_secs),
        }
    }

    /// Validate and compile a workflow, persist the registration, and
    /// insert the mission into the registry with status `registered`.
    pub async fn register(&self, workflow: Workflow, mission_text: String) -> Result<Arc<MissionEntry>> {
        validate(&workflow)?;

        let graph = compile(&workflow);
        let mermaid = mermaid_diagram(&workflow);
        let config = MissionConfig {
            mission_id: MissionId::new(),
            workflow,
            mission_text,
            created_at: Utc::now(),
        };

        self.store.record_mission_created(&config)?;

        let entry = Arc::new(MissionEntry::new(config, graph, mermaid));
        self.registry.insert(entry.clone()).await;
        info!(mission_id = %entry.config.mission_id, "Mission registered");
        Ok(entry)
    }

    /// Start a registered mission. Spawns the mission's executor task
    /// and returns immediately.
    pub async fn run(&self, mission_id: &str) -> Result<()> {
        let entry = self
            .registry
            .get(mission_id)
            .await
            .ok_or_else(|| HubError::MissionNotFound(mission_id.to_string()))?;

        {
            let mut state = entry.state.write().await;
            if state.status != MissionStatus::Registered {
                return Err(HubError::InvalidMissionState {
                    mission_id: mission_id.to_string(),
                    status: state.status.to_string(),
                    expected: MissionStatus::Registered.to_string(),
                });
            }
            state.status = MissionStatus::Running;
            state.started_at = Some(Utc::now());
        }
        self.store.record_mission_started(mission_id)?;
        info!(mission_id, "Mission execution started");

        let ctx = RunContext {
            collector: self.collector.clone(),
            transport: self.transport.clone(),
            store: self.store.clone(),
            agents: self.agents.clone(),
            node_timeout: self.node_timeout,
        };
        tokio::spawn(drive_mission(ctx, entry));
        Ok(())
    }

    /// Best-effort cancellation of a running mission. Pending waiters
    /// are released as abandoned; agent-side work already dispatched
    /// may continue and any late callback is still recorded in history
    /// without affecting mission state.
    pub async fn cancel(&self, mission_id: &str) -> Result<()> {
        let entry = self
            .registry
            .get(mission_id)
            .await
            .ok_or_else(|| HubError::MissionNotFound(mission_id.to_string()))?;

        let status = entry.status().await;
        if status != MissionStatus::Running {
            return Err(HubError::InvalidMissionState {
                mission_id: mission_id.to_string(),
                status: status.to_string(),
                expected: MissionStatus::Running.to_string(),
            });
        }
        entry.cancel.cancel();
        info!(mission_id, "Mission cancellation requested");
        Ok(())
    }
}

/// Mission task body: run the traversal, then write the terminal state
/// and history rows. Errors are absorbed here; they never reach other
/// missions or the host process.
async fn drive_mission(ctx: RunContext, entry: Arc<MissionEntry>) {
    let mission_id = entry.config.mission_id.clone();

    let (status, failure) = match traverse(&ctx, &entry).await {
        Ok(Outcome::Completed) => (MissionStatus::Completed, None),
        Ok(Outcome::Cancelled) => (MissionStatus::Cancelled, None),
        Ok(Outcome::Failed(reason)) => (MissionStatus::Failed, Some(reason)),
        Err(e) => (MissionStatus::Failed, Some(e.to_string())),
    };

    {
        let mut state = entry.state.write().await;
        state.status = status;
        state.completed_at = Some(Utc::now());
        state.error = failure.clone();
    }

    if let Some(ref reason) = failure {
        error!(mission_id = %mission_id, reason, "Mission failed");
        if let Err(e) = ctx.store.add_log(mission_id.as_str(), "ERROR", "Hub", reason) {
            warn!(error = %e, "Failed to write mission error log");
        }
    }
    if let Err(e) = ctx.store.record_mission_completed(mission_id.as_str(), status) {
        warn!(error = %e, "Failed to record mission completion");
    }
    info!(mission_id = %mission_id, status = %status, "Mission finished");
}

async fn traverse(ctx: &RunContext, entry: &Arc<MissionEntry>) -> Result<Outcome> {
    let graph = &entry.graph;
    let mission_id = &entry.config.mission_id;

    // Join bookkeeping: every node waits for its inbound edges; an
    // arrival or an eliminated branch both count one edge down. A node
    // whose edges all resolved runs if any of them was an arrival, and
    // is itself eliminated otherwise.
    let mut remaining: HashMap<String, usize> = graph.indegrees().clone();
    let mut arrived: HashSet<String> = HashSet::new();
    let mut scheduled: HashSet<String> = HashSet::new();
    let mut ready: VecDeque<String> = VecDeque::new();
    let mut reached_end = false;

    for target in graph.entries().to_vec() {
        note_arrival(graph, &target, &mut remaining, &mut arrived, &mut ready);
    }

    let mut tasks: JoinSet<NodeOutcome> = JoinSet::new();

    loop {
        while let Some(node) = ready.pop_front() {
            if node == END_NODE {
                reached_end = true;
                continue;
            }
            if !scheduled.insert(node.clone()) {
                continue;
            }
            entry.state.write().await.current_node = Some(node.clone());
            tasks.spawn(run_node(
                ctx.collector.clone(),
                ctx.transport.clone(),
                mission_id.clone(),
                node,
                entry.config.mission_text.clone(),
                ctx.node_timeout,
            ));
        }

        if tasks.is_empty() {
            break;
        }

        let joined = tokio::select! {
            _ = entry.cancel.cancelled() => {
                tasks.abort_all();
                let released = ctx.collector.abandon_mission(mission_id.as_str()).await;
                debug!(mission_id = %mission_id, released, "Mission cancelled, waiters abandoned");
                return Ok(Outcome::Cancelled);
            }
            joined = tasks.join_next() => joined,
        };

        let outcome = match joined {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => {
                tasks.abort_all();
                ctx.collector.abandon_mission(mission_id.as_str()).await;
                return Err(HubError::Internal(format!("node task failed: {}", e)));
            }
            None => break,
        };

        let NodeOutcome {
            node,
            result,
            started_at,
            synthesized,
        } = outcome;

        entry
            .state
            .write()
            .await
            .results
            .insert(node.clone(), result.clone());

        if synthesized {
            let error_message = (!result.succeeded()).then(|| result.message.clone());
            if let Err(e) = ctx.store.record_agent_execution(
                mission_id.as_str(),
                &node,
                result.status,
                started_at,
                Some(result.timestamp),
                result.result_path.as_deref(),
                error_message.as_deref(),
            ) {
                warn!(error = %e, "Failed to record agent execution");
            }
        }

        let optional = ctx.agents.get(&node).map(|a| a.optional).unwrap_or(false);
        if !result.succeeded() && !optional {
            tasks.abort_all();
            ctx.collector.abandon_mission(mission_id.as_str()).await;
            return Ok(Outcome::Failed(format!(
                "Agent {} reported {}: {}",
                node, result.status, result.message
            )));
        }

        let (taken, skipped) = graph.decide(&node, &result);
        let routes = graph.successors(&node);
        for i in taken {
            note_arrival(graph, &routes[i].target, &mut remaining, &mut arrived, &mut ready);
        }
        for i in skipped {
            note_skip(graph, &routes[i].target, &mut remaining, &mut arrived, &mut ready);
        }
    }

    if !reached_end {
        debug!(mission_id = %mission_id, "Traversal drained without reaching the end sentinel");
    }
    Ok(Outcome::Completed)
}

fn note_arrival(
    graph: &CompiledGraph,
    node: &str,
    remaining: &mut HashMap<String, usize>,
    arrived: &mut HashSet<String>,
    ready: &mut VecDeque<String>,
) {
    arrived.insert(node.to_string());
    settle_edge(graph, node, remaining, arrived, ready);
}

/// Dead-path elimination for an untaken branch: the edge still counts
/// toward the target's join so reconverging nodes never wait on a
/// branch that can no longer run.
fn note_skip(
    graph: &CompiledGraph,
    node: &str,
    remaining: &mut HashMap<String, usize>,
    arrived: &mut HashSet<String>,
    ready: &mut VecDeque<String>,
) {
    settle_edge(graph, node, remaining, arrived, ready);
}

fn settle_edge(
    graph: &CompiledGraph,
    node: &str,
    remaining: &mut HashMap<String, usize>,
    arrived: &mut HashSet<String>,
    ready: &mut VecDeque<String>,
) {
    let slot = remaining.entry(node.to_string()).or_insert(1);
    *slot = slot.saturating_sub(1);
    if *slot > 0 {
        return;
    }

    if arrived.contains(node) {
        ready.push_back(node.to_string());
    } else {
        // No live branch reaches this node; eliminate it transitively.
        for route in graph.successors(node) {
            note_skip(graph, &route.target, remaining, arrived, ready);
        }
    }
}

/// Execute a single agent node: waiter first, then dispatch, then
/// suspend until the callback or the timeout. The waiter is registered
/// before dispatch so a callback can never race past it.
async fn run_node(
    collector: Arc<ResultCollector>,
    transport: Arc<dyn AgentTransport>,
    mission_id: MissionId,
    node: String,
    mission_text: String,
    node_timeout: Duration,
) -> NodeOutcome {
    let started_at = Utc::now();
    let rx = collector.register(&mission_id, &node).await;

    if let Err(e) = transport.dispatch(&node, &mission_id, &mission_text).await {
        collector.discard(mission_id.as_str(), &node).await;
        warn!(mission_id = %mission_id, agent = %node, error = %e, "Dispatch failed");
        let result = AgentResult::error(&node, e.to_string());
        return NodeOutcome {
            node,
            result,
            started_at,
            synthesized: true,
        };
    }

    match tokio::time::timeout(node_timeout, rx).await {
        Ok(Ok(result)) => NodeOutcome {
            node,
            result,
            started_at,
            synthesized: false,
        },
        Ok(Err(_)) => {
            // Waiter dropped without a result (mission torn down).
            let result = AgentResult::error(&node, "result waiter abandoned");
            NodeOutcome {
                node,
                result,
                started_at,
                synthesized: true,
            }
        }
        Err(_) => {
            collector.discard(mission_id.as_str(), &node).await;
            warn!(mission_id = %mission_id, agent = %node, "Timed out waiting for agent result");
            let result = AgentResult::timeout(&node, node_timeout.as_secs());
            NodeOutcome {
                node,
                result,
                started_at,
                synthesized: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenthub_core::types::{ResultStatus, WorkflowEdge};
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    /// Transport that accepts every command without a network and
    /// remembers what it dispatched.
    struct AcceptingTransport {
        dispatched: Mutex<Vec<String>>,
    }

    impl AcceptingTransport {
        fn new() -> Self {
            Self {
                dispatched: Mutex::new(Vec::new()),
            }
        }
    }

    impl AgentTransport for AcceptingTransport {
        fn dispatch(
            &self,
            agent: &str,
            _mission_id: &MissionId,
            _mission_text: &str,
        ) -> BoxFuture<'_, Result<()>> {
            let agent = agent.to_string();
            Box::pin(async move {
                self.dispatched.lock().unwrap().push(agent);
                Ok(())
            })
        }
    }

    /// Transport whose endpoints are all permanently unreachable.
    struct UnreachableTransport;

    impl AgentTransport for UnreachableTransport {
        fn dispatch(
            &self,
            agent: &str,
            _mission_id: &MissionId,
            _mission_text: &str,
        ) -> BoxFuture<'_, Result<()>> {
            let agent = agent.to_string();
            Box::pin(async move {
                Err(HubError::Dispatch {
                    agent,
                    message: "connection refused".into(),
                })
            })
        }
    }

    struct Harness {
        executor: MissionExecutor,
        registry: Arc<MissionRegistry>,
        collector: Arc<ResultCollector>,
    }

    fn harness_with(
        transport: Arc<dyn AgentTransport>,
        agents: HashMap<String, AgentEndpoint>,
        node_timeout_secs: u64,
    ) -> Harness {
        let registry = Arc::new(MissionRegistry::new());
        let collector = Arc::new(ResultCollector::new());
        let store = Arc::new(MissionStore::in_memory().unwrap());
        let executor = MissionExecutor::new(
            registry.clone(),
            collector.clone(),
            transport,
            store,
            agents,
            &ExecutorConfig { node_timeout_secs },
        );
        Harness {
            executor,
            registry,
            collector,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(AcceptingTransport::new()), HashMap::new(), 30)
    }

    fn wf(edges: &[(&str, &str)]) -> Workflow {
        edges.iter().map(|(f, t)| WorkflowEdge::new(*f, *t)).collect()
    }

    /// Resolve a waiter as soon as it appears.
    async fn feed(collector: &ResultCollector, mission_id: &str, agent: &str, result: AgentResult) {
        for _ in 0..500 {
            if collector.resolve(mission_id, agent, result.clone()).await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no waiter appeared for agent {}", agent);
    }

    async fn wait_terminal(registry: &MissionRegistry, mission_id: &str) -> agenthub_core::types::MissionState {
        for _ in 0..500 {
            let entry = registry.get(mission_id).await.unwrap();
            let snapshot = entry.snapshot().await;
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("mission {} never reached a terminal state", mission_id);
    }

    #[tokio::test]
    async fn linear_mission_completes_in_order() {
        let transport = Arc::new(AcceptingTransport::new());
        let h = harness_with(transport.clone(), HashMap::new(), 30);
        let entry = h
            .executor
            .register(
                wf(&[("start", "claude"), ("claude", "gemini"), ("gemini", "end")]),
                "review the code".into(),
            )
            .await
            .unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        feed(&h.collector, &id, "claude", AgentResult::success("claude", "done")).await;
        feed(&h.collector, &id, "gemini", AgentResult::success("gemini", "done")).await;

        let state = wait_terminal(&h.registry, &id).await;
        assert_eq!(state.status, MissionStatus::Completed);
        assert_eq!(state.results["claude"].status, ResultStatus::Success);
        assert_eq!(state.results["gemini"].status, ResultStatus::Success);
        assert!(state.completed_at.is_some());
        assert_eq!(*transport.dispatched.lock().unwrap(), ["claude", "gemini"]);
    }

    #[tokio::test]
    async fn failed_required_node_fails_mission() {
        let h = harness();
        let entry = h
            .executor
            .register(
                wf(&[("start", "claude"), ("claude", "gemini"), ("gemini", "end")]),
                "task".into(),
            )
            .await
            .unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        feed(
            &h.collector,
            &id,
            "claude",
            AgentResult {
                agent: "claude".into(),
                status: ResultStatus::Failed,
                message: "could not comply".into(),
                result_path: None,
                timestamp: Utc::now(),
            },
        )
        .await;

        let state = wait_terminal(&h.registry, &id).await;
        assert_eq!(state.status, MissionStatus::Failed);
        assert!(state.error.as_deref().unwrap().contains("claude"));
        // gemini was never scheduled
        assert!(!state.results.contains_key("gemini"));
    }

    #[tokio::test]
    async fn optional_node_failure_continues() {
        let mut agents = HashMap::new();
        agents.insert(
            "linter".to_string(),
            AgentEndpoint {
                url: "http://localhost:9000".into(),
                timeout_secs: 30,
                max_retries: 0,
                initial_backoff_ms: 1,
                max_backoff_ms: 1,
                optional: true,
            },
        );
        let h = harness_with(Arc::new(AcceptingTransport::new()), agents, 30);
        let entry = h
            .executor
            .register(
                wf(&[("start", "linter"), ("linter", "claude"), ("claude", "end")]),
                "task".into(),
            )
            .await
            .unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        feed(
            &h.collector,
            &id,
            "linter",
            AgentResult {
                agent: "linter".into(),
                status: ResultStatus::Failed,
                message: "lint errors".into(),
                result_path: None,
                timestamp: Utc::now(),
            },
        )
        .await;
        feed(&h.collector, &id, "claude", AgentResult::success("claude", "ok")).await;

        let state = wait_terminal(&h.registry, &id).await;
        assert_eq!(state.status, MissionStatus::Completed);
        assert_eq!(state.results["linter"].status, ResultStatus::Failed);
    }

    #[tokio::test]
    async fn node_timeout_fails_mission() {
        let h = harness_with(Arc::new(AcceptingTransport::new()), HashMap::new(), 0);
        let entry = h
            .executor
            .register(wf(&[("start", "claude"), ("claude", "end")]), "task".into())
            .await
            .unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        // No callback ever arrives.
        let state = wait_terminal(&h.registry, &id).await;
        assert_eq!(state.status, MissionStatus::Failed);
        assert_eq!(state.results["claude"].status, ResultStatus::Timeout);
    }

    #[tokio::test]
    async fn unreachable_endpoint_resolves_as_error() {
        let h = harness_with(Arc::new(UnreachableTransport), HashMap::new(), 30);
        let entry = h
            .executor
            .register(wf(&[("start", "claude"), ("claude", "end")]), "task".into())
            .await
            .unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        let state = wait_terminal(&h.registry, &id).await;
        assert_eq!(state.status, MissionStatus::Failed);
        assert_eq!(state.results["claude"].status, ResultStatus::Error);
    }

    #[tokio::test]
    async fn fan_out_joins_before_downstream_node() {
        let h = harness();
        let entry = h
            .executor
            .register(
                wf(&[
                    ("start", "fan"),
                    ("fan", "left"),
                    ("fan", "right"),
                    ("left", "merge"),
                    ("right", "merge"),
                    ("merge", "end"),
                ]),
                "task".into(),
            )
            .await
            .unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        feed(&h.collector, &id, "fan", AgentResult::success("fan", "ok")).await;
        feed(&h.collector, &id, "left", AgentResult::success("left", "ok")).await;

        // Only one of the two branches has resolved: merge must not be
        // dispatched yet.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(
            !h.collector
                .resolve(&id, "merge", AgentResult::success("merge", "early"))
                .await
        );

        feed(&h.collector, &id, "right", AgentResult::success("right", "ok")).await;
        feed(&h.collector, &id, "merge", AgentResult::success("merge", "ok")).await;

        let state = wait_terminal(&h.registry, &id).await;
        assert_eq!(state.status, MissionStatus::Completed);
        assert_eq!(state.results.len(), 4);
    }

    #[tokio::test]
    async fn conditional_route_skips_untaken_branch() {
        let h = harness();
        let workflow = vec![
            WorkflowEdge::new("start", "triage"),
            WorkflowEdge::when("triage", "escalate", r#"message contains "critical""#),
            WorkflowEdge::new("triage", "archive"),
            WorkflowEdge::new("escalate", "end"),
            WorkflowEdge::new("archive", "end"),
        ];
        let entry = h.executor.register(workflow, "task".into()).await.unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        feed(
            &h.collector,
            &id,
            "triage",
            AgentResult::success("triage", "severity critical"),
        )
        .await;
        feed(&h.collector, &id, "escalate", AgentResult::success("escalate", "paged")).await;

        let state = wait_terminal(&h.registry, &id).await;
        assert_eq!(state.status, MissionStatus::Completed);
        assert!(state.results.contains_key("escalate"));
        assert!(!state.results.contains_key("archive"));
    }

    #[tokio::test]
    async fn concurrent_missions_are_isolated() {
        let h = harness();
        let a = h
            .executor
            .register(wf(&[("start", "claude"), ("claude", "end")]), "mission a".into())
            .await
            .unwrap();
        let b = h
            .executor
            .register(wf(&[("start", "claude"), ("claude", "end")]), "mission b".into())
            .await
            .unwrap();
        let (id_a, id_b) = (a.config.mission_id.0.clone(), b.config.mission_id.0.clone());

        h.executor.run(&id_a).await.unwrap();
        h.executor.run(&id_b).await.unwrap();

        // Resolve in reverse registration order.
        feed(&h.collector, &id_b, "claude", AgentResult::success("claude", "b done")).await;
        let state_b = wait_terminal(&h.registry, &id_b).await;
        assert_eq!(state_b.status, MissionStatus::Completed);

        // Mission A is still running and untouched by B's completion.
        assert_eq!(
            h.registry.get(&id_a).await.unwrap().status().await,
            MissionStatus::Running
        );

        feed(&h.collector, &id_a, "claude", AgentResult::success("claude", "a done")).await;
        let state_a = wait_terminal(&h.registry, &id_a).await;
        assert_eq!(state_a.status, MissionStatus::Completed);
        assert_eq!(state_a.results["claude"].message, "a done");
        assert_eq!(state_b.results["claude"].message, "b done");
    }

    #[tokio::test]
    async fn cancel_releases_waiters() {
        let h = harness();
        let entry = h
            .executor
            .register(wf(&[("start", "claude"), ("claude", "end")]), "task".into())
            .await
            .unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        // Wait until the node's waiter exists, then cancel.
        for _ in 0..500 {
            if h.collector.pending_count().await > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        h.executor.cancel(&id).await.unwrap();

        let state = wait_terminal(&h.registry, &id).await;
        assert_eq!(state.status, MissionStatus::Cancelled);
        assert_eq!(h.collector.pending_count().await, 0);
    }

    #[tokio::test]
    async fn run_requires_registered_state() {
        let h = harness();
        let entry = h
            .executor
            .register(wf(&[("start", "claude"), ("claude", "end")]), "task".into())
            .await
            .unwrap();
        let id = entry.config.mission_id.0.clone();

        h.executor.run(&id).await.unwrap();
        let err = h.executor.run(&id).await.unwrap_err();
        assert!(matches!(err, HubError::InvalidMissionState { .. }));
    }

    #[tokio::test]
    async fn run_unknown_mission_is_not_found() {
        let h = harness();
        let err = h.executor.run("does-not-exist").await.unwrap_err();
        assert!(matches!(err, HubError::MissionNotFound(_)));
    }

    #[tokio::test]
    async fn register_rejects_invalid_workflow() {
        let h = harness();
        let err = h
            .executor
            .register(wf(&[("claude", "end")]), "task".into())
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
        assert!(h.registry.is_empty().await);
    }
}
