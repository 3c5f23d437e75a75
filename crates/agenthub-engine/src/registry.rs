use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use agenthub_core::types::{MissionConfig, MissionState, MissionStatus};

use crate::graph::CompiledGraph;

/// One live mission: immutable definition plus its mutable state.
///
/// The state lock supports concurrent readers (status/results queries)
/// while the owning executor task is the single writer during a run;
/// late callbacks may overwrite a result entry after the run ends.
#[derive(Debug)]
pub struct MissionEntry {
    pub config: MissionConfig,
    pub graph: CompiledGraph,
    pub mermaid: String,
    pub state: RwLock<MissionState>,
    pub cancel: CancellationToken,
}

impl MissionEntry {
    pub fn new(config: MissionConfig, graph: CompiledGraph, mermaid: String) -> Self {
        Self {
            config,
            graph,
            mermaid,
            state: RwLock::new(MissionState::registered()),
            cancel: CancellationToken::new(),
        }
    }

    pub async fn status(&self) -> MissionStatus {
        self.state.read().await.status
    }

    /// Point-in-time copy of the mutable state.
    pub async fn snapshot(&self) -> MissionState {
        self.state.read().await.clone()
    }
}

/// Canonical in-memory registry of all live missions.
///
/// Constructed once at process start and passed to handlers; never
/// ambient global state. Entries are retained indefinitely — durable
/// history lives in the store.
pub struct MissionRegistry {
    missions: RwLock<HashMap<String, Arc<MissionEntry>>>,
}

impl MissionRegistry {
    pub fn new() -> Self {
        Self {
            missions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, entry: Arc<MissionEntry>) {
        self.missions
            .write()
            .await
            .insert(entry.config.mission_id.0.clone(), entry);
    }

    pub async fn get(&self, mission_id: &str) -> Option<Arc<MissionEntry>> {
        self.missions.read().await.get(mission_id).cloned()
    }

    pub async fn contains(&self, mission_id: &str) -> bool {
        self.missions.read().await.contains_key(mission_id)
    }

    /// All missions, newest first.
    pub async fn list(&self) -> Vec<Arc<MissionEntry>> {
        let mut entries: Vec<_> = self.missions.read().await.values().cloned().collect();
        entries.sort_by(|a, b| b.config.created_at.cmp(&a.config.created_at));
        entries
    }

    pub async fn len(&self) -> usize {
        self.missions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.missions.read().await.is_empty()
    }
}

impl Default for MissionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
