use super::{CloudApi, ComputeResource, DatabaseResource, GroupCapacity, LifecycleState};
use crate::config::CloudConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// HTTP JSON client for the cloud control-plane gateway.
///
/// A thin I/O mapping with no scheduling logic: one POST per operation,
/// bearer auth, JSON bodies in and out.
pub struct GatewayClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GatewayClient {
    pub fn new(config: &CloudConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    async fn post(&self, endpoint: &str, payload: Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Gateway call: {}", endpoint);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("Gateway request {} failed: {}", endpoint, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Gateway {} returned status {}: {}",
                endpoint,
                status,
                body
            ));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse gateway response from {}: {}", endpoint, e))
    }

    fn field<T: serde::de::DeserializeOwned>(result: &Value, key: &str, endpoint: &str) -> Result<T> {
        let value = result
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("Gateway {} response missing '{}'", endpoint, key))?;
        serde_json::from_value(value)
            .map_err(|e| anyhow!("Invalid '{}' in gateway {} response: {}", key, endpoint, e))
    }
}

#[async_trait]
impl CloudApi for GatewayClient {
    async fn list_regions(&self) -> Result<Vec<String>> {
        let result = self.post("/regions/describe", json!({})).await?;
        Self::field(&result, "regions", "/regions/describe")
    }

    async fn list_compute(&self, region: &str) -> Result<Vec<ComputeResource>> {
        let result = self
            .post("/compute/describe", json!({ "region": region }))
            .await?;
        Self::field(&result, "resources", "/compute/describe")
    }

    async fn list_databases(&self, region: &str) -> Result<Vec<DatabaseResource>> {
        let result = self
            .post("/database/describe", json!({ "region": region }))
            .await?;
        Self::field(&result, "databases", "/database/describe")
    }

    async fn start_compute(&self, region: &str, ids: &[String]) -> Result<()> {
        self.post("/compute/start", json!({ "region": region, "ids": ids }))
            .await?;
        Ok(())
    }

    async fn stop_compute(&self, region: &str, ids: &[String]) -> Result<()> {
        self.post("/compute/stop", json!({ "region": region, "ids": ids }))
            .await?;
        Ok(())
    }

    async fn start_database(&self, region: &str, id: &str) -> Result<()> {
        self.post("/database/start", json!({ "region": region, "id": id }))
            .await?;
        Ok(())
    }

    async fn stop_database(&self, region: &str, id: &str) -> Result<()> {
        self.post("/database/stop", json!({ "region": region, "id": id }))
            .await?;
        Ok(())
    }

    async fn group_capacity(&self, region: &str, group: &str) -> Result<GroupCapacity> {
        let result = self
            .post("/group/capacity", json!({ "region": region, "group": group }))
            .await?;
        Self::field(&result, "capacity", "/group/capacity")
    }

    async fn enter_standby(&self, region: &str, group: &str, ids: &[String]) -> Result<()> {
        self.post(
            "/group/enter-standby",
            json!({ "region": region, "group": group, "ids": ids }),
        )
        .await?;
        Ok(())
    }

    async fn exit_standby(&self, region: &str, group: &str, ids: &[String]) -> Result<()> {
        self.post(
            "/group/exit-standby",
            json!({ "region": region, "group": group, "ids": ids }),
        )
        .await?;
        Ok(())
    }

    async fn lifecycle_state(&self, region: &str, id: &str) -> Result<LifecycleState> {
        let result = self
            .post("/compute/state", json!({ "region": region, "id": id }))
            .await?;
        Self::field(&result, "state", "/compute/state")
    }
}
