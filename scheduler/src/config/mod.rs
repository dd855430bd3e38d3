pub mod manager;
use serde::{Deserialize, Serialize};
pub use manager::ConfigManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub cloud: CloudConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_time")]
    pub default_start_time: String,
    #[serde(default = "default_time")]
    pub default_stop_time: String,
    #[serde(default = "default_time_zone")]
    pub default_time_zone: String,
    #[serde(default = "default_days_active")]
    pub default_days_active: String,
    #[serde(default = "default_tag_key")]
    pub tag_key: String,
    #[serde(default = "default_database_tag_key")]
    pub database_tag_key: String,
    /// Evaluation cadence and look-back window width, one of 5/15/30/60.
    #[serde(default = "default_granularity")]
    pub granularity_minutes: u32,
}

fn default_time() -> String {
    "none".to_string()
}

fn default_time_zone() -> String {
    "utc".to_string()
}

fn default_days_active() -> String {
    "all".to_string()
}

fn default_tag_key() -> String {
    "scheduler:startstop".to_string()
}

fn default_database_tag_key() -> String {
    "scheduler:db-startstop".to_string()
}

fn default_granularity() -> u32 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    pub gateway_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Regions to evaluate; empty means discover through the gateway.
    #[serde(default)]
    pub regions: Vec<String>,
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub group_support: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            group_support: false,
            poll_interval_seconds: default_poll_interval(),
            poll_timeout_seconds: default_poll_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    10
}

fn default_poll_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Empty endpoint disables the sink.
    #[serde(default)]
    pub endpoint: String,
}
