use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use agenthub_core::config::{GatewayConfig, StorageConfig};
use agenthub_engine::{MissionExecutor, MissionRegistry, ResultCollector};
use agenthub_store::MissionStore;

use crate::routes;
use crate::state::AppState;

/// Build the hub's HTTP router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/mission/register", post(routes::register_mission))
        .route("/api/missions", get(routes::list_missions))
        .route("/api/mission/{id}/graph", get(routes::mission_graph))
        .route("/api/mission/{id}/run", post(routes::run_mission))
        .route("/api/mission/{id}/cancel", post(routes::cancel_mission))
        .route("/api/mission/{id}/status", get(routes::mission_status))
        .route("/api/mission/{id}/results", get(routes::all_results))
        .route("/api/mission/{id}/results/{agent}", get(routes::agent_result))
        .route("/api/mission/{id}/history", get(routes::mission_history))
        .route("/api/mission/{id}/report", get(routes::mission_report))
        .route("/api/stats", get(routes::stats))
        .route("/api/agent/result", post(routes::receive_agent_result))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP hub server built on axum.
pub struct HubServer {
    config: GatewayConfig,
    storage: StorageConfig,
    registry: Arc<MissionRegistry>,
    executor: Arc<MissionExecutor>,
    collector: Arc<ResultCollector>,
    store: Arc<MissionStore>,
}

impl HubServer {
    pub fn new(
        config: GatewayConfig,
        storage: StorageConfig,
        registry: Arc<MissionRegistry>,
        executor: Arc<MissionExecutor>,
        collector: Arc<ResultCollector>,
        store: Arc<MissionStore>,
    ) -> Self {
        Self {
            config,
            storage,
            registry,
            executor,
            collector,
            store,
        }
    }

    /// Run the hub server until the cancellation token is triggered.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let state = Arc::new(AppState {
            config: self.config.clone(),
            storage: self.storage.clone(),
            registry: self.registry.clone(),
            executor: self.executor.clone(),
            collector: self.collector.clone(),
            store: self.store.clone(),
        });

        let app = router(state);

        let listener = TcpListener::bind(&self.config.bind).await?;
        info!(bind = %self.config.bind, "Hub listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Hub shut down");
        Ok(())
    }
}
