use agenthub_core::types::WorkflowEdge;

/// Render a workflow as a Mermaid flowchart, one line per edge in
/// insertion order. Deterministic: identical input produces identical
/// output.
pub fn mermaid_diagram(workflow: &[WorkflowEdge]) -> String {
    let mut mermaid = String::from("graph TD\n");
    for edge in workflow {
        mermaid.push_str(&format!("    {} --> {}\n", edge.from, edge.to));
    }
    mermaid
}
