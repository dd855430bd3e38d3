use super::Config;
use crate::schedule::{resolve_time_zone, GRANULARITIES};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::fs;

#[derive(Debug)]
pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_path: &str) -> Result<Self> {
        let config = Self::load_configuration(config_path).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_path: &str) -> Result<Config> {
        let content = fs::read_to_string(config_path)
            .await
            .map_err(|e| anyhow!("Failed to read config {}: {}", config_path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config {}: {}", config_path, e))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &Config) -> Result<()> {
        if !GRANULARITIES.contains(&config.schedule.granularity_minutes) {
            return Err(anyhow!(
                "Invalid granularity_minutes {}: must be one of {:?}",
                config.schedule.granularity_minutes,
                GRANULARITIES
            ));
        }

        if resolve_time_zone(&config.schedule.default_time_zone).is_none() {
            return Err(anyhow!(
                "Unsupported default_time_zone: {}",
                config.schedule.default_time_zone
            ));
        }

        if config.schedule.tag_key.is_empty() {
            return Err(anyhow!("tag_key must not be empty"));
        }

        if config.cloud.gateway_url.is_empty() {
            return Err(anyhow!("gateway_url must not be empty"));
        }

        if config.fleet.poll_interval_seconds == 0 || config.fleet.poll_timeout_seconds == 0 {
            return Err(anyhow!(
                "Fleet poll interval and timeout must be non-zero"
            ));
        }

        Ok(())
    }
}
