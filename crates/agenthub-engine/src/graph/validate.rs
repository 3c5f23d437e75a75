use std::collections::{HashMap, HashSet};

use agenthub_core::error::ValidationError;
use agenthub_core::types::{WorkflowEdge, END_NODE, START_NODE};

/// Check a submitted edge list for structural correctness.
///
/// In order: the workflow must be non-empty, have at least one edge
/// out of `start`, at least one edge into `end`, and the subgraph over
/// non-sentinel nodes must be acyclic. A node reached again via a
/// different path after being fully explored is fine — graphs may
/// legitimately reconverge.
pub fn validate(workflow: &[WorkflowEdge]) -> Result<(), ValidationError> {
    if workflow.is_empty() {
        return Err(ValidationError::EmptyWorkflow);
    }
    if !workflow.iter().any(|e| e.from == START_NODE) {
        return Err(ValidationError::MissingStartNode);
    }
    if !workflow.iter().any(|e| e.to == END_NODE) {
        return Err(ValidationError::MissingEndNode);
    }

    // Adjacency over non-sentinel source nodes.
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in workflow {
        if edge.from != START_NODE {
            adjacency.entry(&edge.from).or_default().push(&edge.to);
        }
    }

    let mut explored: HashSet<&str> = HashSet::new();
    for edge in workflow.iter().filter(|e| e.from == START_NODE) {
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        dfs(&edge.to, &adjacency, &mut path, &mut on_path, &mut explored)?;
    }

    Ok(())
}

fn dfs<'a>(
    node: &'a str,
    adjacency: &HashMap<&str, Vec<&'a str>>,
    path: &mut Vec<&'a str>,
    on_path: &mut HashSet<&'a str>,
    explored: &mut HashSet<&'a str>,
) -> Result<(), ValidationError> {
    if node == END_NODE {
        return Ok(());
    }
    if on_path.contains(node) {
        // Report the cycle segment, closed back on the revisited node.
        let first = path.iter().position(|n| *n == node).unwrap_or(0);
        let mut cycle: Vec<String> = path[first..].iter().map(|n| n.to_string()).collect();
        cycle.push(node.to_string());
        return Err(ValidationError::CycleDetected { path: cycle });
    }
    if explored.contains(node) {
        return Ok(());
    }

    path.push(node);
    on_path.insert(node);

    if let Some(successors) = adjacency.get(node) {
        for &next in successors {
            dfs(next, adjacency, path, on_path, explored)?;
        }
    }

    path.pop();
    on_path.remove(node);
    explored.insert(node);
    Ok(())
}
