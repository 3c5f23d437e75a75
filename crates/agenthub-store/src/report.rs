use std::fmt::Write;

use crate::store::MissionHistory;

/// Render a mission's full history as a markdown report: overview,
/// mission text, workflow diagram, per-agent executions, and the audit
/// log. Pure function of the history snapshot.
pub fn render_report(history: &MissionHistory) -> String {
    let mission = &history.mission;
    let mut report = String::new();

    let _ = write!(
        report,
        "# Mission Report: {}\n\n\
         ## Overview\n\
         - **Status**: {}\n\
         - **Created**: {}\n\
         - **Started**: {}\n\
         - **Completed**: {}\n\
         - **Duration**: {} seconds\n\n\
         ## Mission\n{}\n\n\
         ## Workflow\n```mermaid\ngraph TD\n",
        mission.mission_id,
        mission.status,
        mission.created_at,
        mission.started_at.as_deref().unwrap_or("N/A"),
        mission.completed_at.as_deref().unwrap_or("N/A"),
        mission
            .total_duration_seconds
            .map(|d| format!("{:.1}", d))
            .unwrap_or_else(|| "N/A".into()),
        mission.mission_text,
    );

    for edge in &history.workflow {
        let _ = writeln!(report, "    {} --> {}", edge.from, edge.to);
    }
    report.push_str("```\n\n## Agent Executions\n");

    for agent in &history.agent_executions {
        let _ = write!(
            report,
            "\n### {}\n\
             - **Status**: {}\n\
             - **Started**: {}\n\
             - **Duration**: {} seconds\n",
            agent.agent_name,
            agent.status,
            agent.started_at,
            agent
                .duration_seconds
                .map(|d| format!("{:.1}", d))
                .unwrap_or_else(|| "N/A".into()),
        );
        if let Some(ref error) = agent.error_message {
            let _ = writeln!(report, "- **Error**: {}", error);
        }
        if let Some(ref path) = agent.result_path {
            let _ = writeln!(report, "- **Result**: {}", path);
        }
    }

    report.push_str("\n## Execution Logs\n```\n");
    for log in &history.logs {
        let _ = writeln!(
            report,
            "[{}] {} - {}: {}",
            log.timestamp, log.level, log.component, log.message
        );
    }
    report.push_str("```\n");

    report
}
