use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex};
use tracing::debug;

use agenthub_core::types::{AgentResult, MissionId};

/// Waiter key: one pending wait per `(mission, agent)` pair.
type WaiterKey = (String, String);

/// Inbound boundary between agent callbacks and suspended executors.
///
/// The executor registers a waiter *before* dispatching a command, so
/// a callback can never arrive ahead of its waiter. The callback
/// handler resolves the waiter by key; resolving an unknown key is not
/// an error (late or duplicate callbacks are tolerated by design).
pub struct ResultCollector {
    pending: Mutex<HashMap<WaiterKey, oneshot::Sender<AgentResult>>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Register a waiter for an agent's result. Returns the receiver
    /// to suspend on. A second registration for the same key replaces
    /// the first (the old receiver resolves as abandoned).
    pub async fn register(&self, mission_id: &MissionId, agent: &str) -> oneshot::Receiver<AgentResult> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .await
            .insert((mission_id.0.clone(), agent.to_string()), tx);
        rx
    }

    /// Resolve a pending waiter with an agent result.
    ///
    /// Returns true if a waiter was pending and has been handed the
    /// result; false if none was (duplicate or late callback).
    pub async fn resolve(&self, mission_id: &str, agent: &str, result: AgentResult) -> bool {
        let entry = self
            .pending
            .lock()
            .await
            .remove(&(mission_id.to_string(), agent.to_string()));
        match entry {
            Some(tx) => {
                // Ignore send error (receiver may have timed out)
                let _ = tx.send(result);
                true
            }
            None => {
                debug!(mission_id, agent, "No pending waiter for result");
                false
            }
        }
    }

    /// Drop a single waiter without resolving it (timeout cleanup).
    pub async fn discard(&self, mission_id: &str, agent: &str) {
        self.pending
            .lock()
            .await
            .remove(&(mission_id.to_string(), agent.to_string()));
    }

    /// Drop every pending waiter for a mission, treating them as
    /// abandoned rather than failed. Used on cancellation. Returns the
    /// number of waiters released.
    pub async fn abandon_mission(&self, mission_id: &str) -> usize {
        let mut pending = self.pending.lock().await;
        let before = pending.len();
        pending.retain(|(mid, _), _| mid != mission_id);
        before - pending.len()
    }

    /// Number of waiters currently pending.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}
