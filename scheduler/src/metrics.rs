use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Optional per-resource up/down metrics, posted to a webhook endpoint.
///
/// Purely observational: failures are logged and never propagated, and an
/// empty endpoint disables the sink entirely.
pub struct MetricsSink {
    endpoint: String,
    client: Client,
}

impl MetricsSink {
    pub fn new(endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client for MetricsSink");

        Self { endpoint, client }
    }

    pub fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
    }

    pub async fn record_state(&self, region: &str, resource_id: &str, up: bool) {
        if !self.is_enabled() {
            return;
        }

        let payload = serde_json::json!({
            "namespace": "FleetScheduler",
            "metric": resource_id,
            "region": region,
            "value": if up { 1 } else { 0 },
            "timestamp": Utc::now(),
        });

        match timeout(
            Duration::from_secs(10),
            self.client.post(&self.endpoint).json(&payload).send(),
        )
        .await
        {
            Ok(Ok(response)) if response.status().is_success() => {
                debug!("Recorded metric for {}: {}", resource_id, up as u8);
            }
            Ok(Ok(response)) => {
                warn!(
                    "Metrics endpoint returned status {} for {}",
                    response.status(),
                    resource_id
                );
            }
            Ok(Err(e)) => {
                warn!("Failed to record metric for {}: {}", resource_id, e);
            }
            Err(_) => {
                warn!("Metric post timeout for {}", resource_id);
            }
        }
    }
}
