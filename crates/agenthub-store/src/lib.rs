pub mod report;
pub mod stats;
pub mod store;

pub use report::render_report;
pub use stats::{AgentStats, MissionStats, OverallStats, RecentMission};
pub use store::{AgentExecutionRow, LogRow, MissionHistory, MissionRow, MissionStore};
