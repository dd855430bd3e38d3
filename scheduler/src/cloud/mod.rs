//! Cloud control-plane contract
//!
//! Everything the scheduler needs from the provider is behind [`CloudApi`]:
//! inventory, tags, lifecycle transitions and group capacity. All calls are
//! network-fallible and refreshed once per cycle; the scheduler keeps no
//! state of its own between cycles.

pub mod gateway;
pub use gateway::GatewayClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Running,
    Stopped,
    Standby,
    Pending,
    Unknown,
}

impl LifecycleState {
    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, LifecycleState::Stopped)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeResource {
    pub id: String,
    pub state: LifecycleState,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Elastic group membership, if any.
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseResource {
    pub id: String,
    /// Provider status string, e.g. "available" or "stopped".
    pub status: String,
    #[serde(default)]
    pub multi_az: bool,
    #[serde(default)]
    pub has_read_replicas: bool,
    #[serde(default)]
    pub is_read_replica: bool,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Group capacity, read-only within a cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupCapacity {
    pub desired_capacity: u32,
    pub min_size: u32,
}

impl GroupCapacity {
    /// How many members may leave active rotation without breaching the
    /// group's minimum size.
    pub fn max_quarantine(&self) -> u32 {
        self.desired_capacity.saturating_sub(self.min_size)
    }
}

#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn list_regions(&self) -> Result<Vec<String>>;

    async fn list_compute(&self, region: &str) -> Result<Vec<ComputeResource>>;

    async fn list_databases(&self, region: &str) -> Result<Vec<DatabaseResource>>;

    async fn start_compute(&self, region: &str, ids: &[String]) -> Result<()>;

    async fn stop_compute(&self, region: &str, ids: &[String]) -> Result<()>;

    async fn start_database(&self, region: &str, id: &str) -> Result<()>;

    async fn stop_database(&self, region: &str, id: &str) -> Result<()>;

    async fn group_capacity(&self, region: &str, group: &str) -> Result<GroupCapacity>;

    /// Move members out of active rotation (standby) without terminating.
    async fn enter_standby(&self, region: &str, group: &str, ids: &[String]) -> Result<()>;

    /// Return members to active rotation.
    async fn exit_standby(&self, region: &str, group: &str, ids: &[String]) -> Result<()>;

    async fn lifecycle_state(&self, region: &str, id: &str) -> Result<LifecycleState>;
}
