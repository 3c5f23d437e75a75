use std::collections::HashMap;

use agenthub_core::types::{AgentResult, WorkflowEdge, START_NODE};

/// One outgoing edge of a compiled node.
#[derive(Debug, Clone)]
pub struct Route {
    pub target: String,
    /// Predicate over the source node's own result. `None` means the
    /// route is a static successor.
    pub when: Option<String>,
}

/// Executable form of a validated workflow: entry targets plus a
/// per-node route table and indegrees for join bookkeeping.
///
/// Compilation is deterministic and performs no I/O. The workflow is
/// assumed to have passed [`validate`](super::validate).
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    entries: Vec<String>,
    routes: HashMap<String, Vec<Route>>,
    indegree: HashMap<String, usize>,
    agents: Vec<String>,
}

impl CompiledGraph {
    /// Targets of `start` edges. Multiple entries are parallel entry
    /// branches.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Non-sentinel nodes in first-appearance order.
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// Number of inbound edges per node, `start` edges included. A
    /// reconverging node only runs once all live inbound branches
    /// have resolved.
    pub fn indegrees(&self) -> &HashMap<String, usize> {
        &self.indegree
    }

    /// All outgoing routes of a node, taken or not.
    pub fn successors(&self, node: &str) -> &[Route] {
        self.routes.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Evaluate the transition function for a node given its result.
    ///
    /// Returns (taken, skipped) indices into [`successors`]. When the
    /// node has conditional routes, the first whose predicate matches
    /// wins and every other route is skipped; if none match, the
    /// static routes are the fallback. A node with only static routes
    /// fans out to all of them.
    pub fn decide(&self, node: &str, result: &AgentResult) -> (Vec<usize>, Vec<usize>) {
        let routes = self.successors(node);
        let conditional: Vec<usize> = routes
            .iter()
            .enumerate()
            .filter(|(_, r)| r.when.is_some())
            .map(|(i, _)| i)
            .collect();

        if conditional.is_empty() {
            return ((0..routes.len()).collect(), Vec::new());
        }

        let matched = conditional.iter().copied().find(|&i| {
            routes[i]
                .when
                .as_deref()
                .is_some_and(|expr| evaluate_condition(expr, result))
        });

        match matched {
            Some(winner) => {
                let skipped = (0..routes.len()).filter(|&i| i != winner).collect();
                (vec![winner], skipped)
            }
            None => {
                let taken: Vec<usize> = (0..routes.len())
                    .filter(|i| !conditional.contains(i))
                    .collect();
                (taken, conditional)
            }
        }
    }
}

/// Turn a validated edge list into a [`CompiledGraph`].
pub fn compile(workflow: &[WorkflowEdge]) -> CompiledGraph {
    let mut entries = Vec::new();
    let mut routes: HashMap<String, Vec<Route>> = HashMap::new();
    let mut indegree: HashMap<String, usize> = HashMap::new();
    let mut agents = Vec::new();

    for edge in workflow {
        *indegree.entry(edge.to.clone()).or_insert(0) += 1;

        if edge.from == START_NODE {
            entries.push(edge.to.clone());
        } else {
            routes.entry(edge.from.clone()).or_default().push(Route {
                target: edge.to.clone(),
                when: edge.when.clone(),
            });
        }

        for node in [&edge.from, &edge.to] {
            if !agenthub_core::types::is_sentinel(node) && !agents.contains(node) {
                agents.push(node.clone());
            }
        }
    }

    CompiledGraph {
        entries,
        routes,
        indegree,
        agents,
    }
}

/// Evaluate a route predicate against an agent result.
///
/// Supported expressions, checked against the result's `status`,
/// `message`, `agent`, and `result_path` fields:
/// - `key == "value"` — exact match
/// - `key != "value"` — not equal
/// - `key contains "substr"` — substring match
///
/// Returns `false` for unparseable expressions or unknown keys.
pub fn evaluate_condition(expr: &str, result: &AgentResult) -> bool {
    let expr = expr.trim();

    if let Some((key, substr)) = parse_operator(expr, "contains") {
        return field(result, key).is_some_and(|v| v.contains(substr));
    }

    if let Some((key, value)) = parse_operator(expr, "!=") {
        return field(result, key).is_some_and(|v| v != value);
    }

    if let Some((key, value)) = parse_operator(expr, "==") {
        return field(result, key).is_some_and(|v| v == value);
    }

    false
}

fn field<'a>(result: &'a AgentResult, key: &str) -> Option<&'a str> {
    match key {
        "status" => Some(result.status.as_str()),
        "message" => Some(&result.message),
        "agent" => Some(&result.agent),
        "result_path" => result.result_path.as_deref(),
        _ => None,
    }
}

/// Parse `key OP "value"` expressions, returning (key, value).
fn parse_operator<'a>(expr: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let parts: Vec<&str> = expr.splitn(2, op).collect();
    if parts.len() != 2 {
        return None;
    }
    let key = parts[0].trim();
    let val = parts[1].trim().trim_matches('"');
    Some((key, val))
}
