use std::collections::HashMap;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::json;
use tracing::{debug, warn};

use agenthub_core::config::AgentEndpoint;
use agenthub_core::error::{HubError, Result};
use agenthub_core::types::MissionId;

/// Sends a command to an external agent endpoint.
///
/// `dispatch` returns as soon as the remote accepts or rejects the
/// command; acceptance does not mean the agent's work is finished.
/// The agent reports its actual outcome later via the result callback.
pub trait AgentTransport: Send + Sync + 'static {
    fn dispatch(
        &self,
        agent: &str,
        mission_id: &MissionId,
        mission_text: &str,
    ) -> BoxFuture<'_, Result<()>>;
}

/// Reqwest-backed dispatcher resolving agents through the configured
/// registry. Network-level failures are retried with exponential
/// backoff; a response from the remote, success or not, is final and
/// never retried.
pub struct HttpDispatcher {
    client: reqwest::Client,
    agents: HashMap<String, AgentEndpoint>,
}

impl HttpDispatcher {
    pub fn new(agents: HashMap<String, AgentEndpoint>) -> Self {
        Self {
            client: reqwest::Client::new(),
            agents,
        }
    }
}

fn calculate_backoff(attempt: u32, endpoint: &AgentEndpoint) -> Duration {
    let ms = (endpoint.initial_backoff_ms * 2u64.pow(attempt)).min(endpoint.max_backoff_ms);
    // Add jitter: 0.8x to 1.2x
    let jitter = 0.8 + rand::random::<f64>() * 0.4;
    Duration::from_millis((ms as f64 * jitter) as u64)
}

impl AgentTransport for HttpDispatcher {
    fn dispatch(
        &self,
        agent: &str,
        mission_id: &MissionId,
        mission_text: &str,
    ) -> BoxFuture<'_, Result<()>> {
        let agent = agent.to_string();
        let mission_id = mission_id.clone();
        let mission_text = mission_text.to_string();

        Box::pin(async move {
            let endpoint = self
                .agents
                .get(&agent)
                .ok_or_else(|| HubError::AgentNotRegistered(agent.clone()))?;

            let url = format!("{}/api/agent/command", endpoint.url.trim_end_matches('/'));
            let body = json!({
                "missionId": mission_id.as_str(),
                "agent": agent,
                "mission": mission_text,
            });

            let mut last_err = None;
            for attempt in 0..=endpoint.max_retries {
                let send = self
                    .client
                    .post(&url)
                    .timeout(Duration::from_secs(endpoint.timeout_secs))
                    .json(&body)
                    .send()
                    .await;

                match send {
                    Ok(response) if response.status().is_success() => {
                        debug!(agent = %agent, mission_id = %mission_id, "Agent accepted command");
                        return Ok(());
                    }
                    Ok(response) => {
                        // The remote answered; its rejection is final.
                        return Err(HubError::DispatchRejected {
                            agent,
                            reason: format!("HTTP {}", response.status()),
                        });
                    }
                    Err(e) => {
                        if attempt < endpoint.max_retries {
                            let backoff = calculate_backoff(attempt, endpoint);
                            warn!(
                                agent = %agent,
                                attempt = attempt + 1,
                                max_retries = endpoint.max_retries,
                                backoff_ms = backoff.as_millis() as u64,
                                error = %e,
                                "Retrying agent dispatch"
                            );
                            tokio::time::sleep(backoff).await;
                        }
                        last_err = Some(e);
                    }
                }
            }

            Err(HubError::Dispatch {
                message: last_err
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "retries exhausted".into()),
                agent,
            })
        })
    }
}
