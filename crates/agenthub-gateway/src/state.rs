use std::sync::Arc;

use agenthub_core::config::{GatewayConfig, StorageConfig};
use agenthub_engine::{MissionExecutor, MissionRegistry, ResultCollector};
use agenthub_store::MissionStore;

/// Shared application state for axum handlers.
pub struct AppState {
    pub config: GatewayConfig,
    pub storage: StorageConfig,
    pub registry: Arc<MissionRegistry>,
    pub executor: Arc<MissionExecutor>,
    pub collector: Arc<ResultCollector>,
    pub store: Arc<MissionStore>,
}
