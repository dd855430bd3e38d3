//! Shared test fixtures: an in-memory cloud API with call recording, plus
//! config and runner builders.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use scheduler::cloud::{
    CloudApi, ComputeResource, DatabaseResource, GroupCapacity, LifecycleState,
};
use scheduler::config::{
    CloudConfig, Config, DatabaseConfig, FleetConfig, MetricsConfig, ScheduleConfig,
};
use scheduler::fleet::FleetTransitionController;
use scheduler::metrics::MetricsSink;
use scheduler::runner::ScheduleRunner;
use scheduler::schedule::ScheduleDefaults;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const REGION: &str = "eu-west-1";

pub struct MockCloudApi {
    regions: Vec<String>,
    compute: Mutex<HashMap<String, Vec<ComputeResource>>>,
    databases: Mutex<HashMap<String, Vec<DatabaseResource>>>,
    capacities: Mutex<HashMap<String, GroupCapacity>>,
    states: Mutex<HashMap<String, LifecycleState>>,
    calls: Mutex<Vec<String>>,
    failing_regions: Mutex<HashSet<String>>,
    // groups whose standby transition never takes effect
    stalled_groups: Mutex<HashSet<String>>,
}

impl MockCloudApi {
    pub fn new(regions: &[&str]) -> Self {
        Self {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            compute: Mutex::new(HashMap::new()),
            databases: Mutex::new(HashMap::new()),
            capacities: Mutex::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing_regions: Mutex::new(HashSet::new()),
            stalled_groups: Mutex::new(HashSet::new()),
        }
    }

    pub fn add_compute(&self, region: &str, resource: ComputeResource) {
        self.states
            .lock()
            .unwrap()
            .insert(resource.id.clone(), resource.state);
        self.compute
            .lock()
            .unwrap()
            .entry(region.to_string())
            .or_default()
            .push(resource);
    }

    pub fn add_database(&self, region: &str, database: DatabaseResource) {
        self.databases
            .lock()
            .unwrap()
            .entry(region.to_string())
            .or_default()
            .push(database);
    }

    pub fn set_capacity(&self, group: &str, desired_capacity: u32, min_size: u32) {
        self.capacities.lock().unwrap().insert(
            group.to_string(),
            GroupCapacity {
                desired_capacity,
                min_size,
            },
        );
    }

    pub fn set_state(&self, id: &str, state: LifecycleState) {
        self.states.lock().unwrap().insert(id.to_string(), state);
    }

    pub fn state_of(&self, id: &str) -> Option<LifecycleState> {
        self.states.lock().unwrap().get(id).copied()
    }

    pub fn fail_region(&self, region: &str) {
        self.failing_regions
            .lock()
            .unwrap()
            .insert(region.to_string());
    }

    pub fn stall_standby(&self, group: &str) {
        self.stalled_groups
            .lock()
            .unwrap()
            .insert(group.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CloudApi for MockCloudApi {
    async fn list_regions(&self) -> Result<Vec<String>> {
        Ok(self.regions.clone())
    }

    async fn list_compute(&self, region: &str) -> Result<Vec<ComputeResource>> {
        if self.failing_regions.lock().unwrap().contains(region) {
            return Err(anyhow!("describe failed in {}", region));
        }
        let states = self.states.lock().unwrap();
        let compute = self.compute.lock().unwrap();
        Ok(compute
            .get(region)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|mut resource| {
                if let Some(state) = states.get(&resource.id) {
                    resource.state = *state;
                }
                resource
            })
            .collect())
    }

    async fn list_databases(&self, region: &str) -> Result<Vec<DatabaseResource>> {
        if self.failing_regions.lock().unwrap().contains(region) {
            return Err(anyhow!("describe failed in {}", region));
        }
        Ok(self
            .databases
            .lock()
            .unwrap()
            .get(region)
            .cloned()
            .unwrap_or_default())
    }

    async fn start_compute(&self, _region: &str, ids: &[String]) -> Result<()> {
        self.record(format!("start_compute:{}", ids.join(",")));
        let mut states = self.states.lock().unwrap();
        for id in ids {
            states.insert(id.clone(), LifecycleState::Running);
        }
        Ok(())
    }

    async fn stop_compute(&self, _region: &str, ids: &[String]) -> Result<()> {
        self.record(format!("stop_compute:{}", ids.join(",")));
        let mut states = self.states.lock().unwrap();
        for id in ids {
            states.insert(id.clone(), LifecycleState::Stopped);
        }
        Ok(())
    }

    async fn start_database(&self, _region: &str, id: &str) -> Result<()> {
        self.record(format!("start_database:{}", id));
        Ok(())
    }

    async fn stop_database(&self, _region: &str, id: &str) -> Result<()> {
        self.record(format!("stop_database:{}", id));
        Ok(())
    }

    async fn group_capacity(&self, _region: &str, group: &str) -> Result<GroupCapacity> {
        self.record(format!("group_capacity:{}", group));
        self.capacities
            .lock()
            .unwrap()
            .get(group)
            .copied()
            .ok_or_else(|| anyhow!("group {} not found", group))
    }

    async fn enter_standby(&self, _region: &str, group: &str, ids: &[String]) -> Result<()> {
        self.record(format!("enter_standby:{}:{}", group, ids.join(",")));
        if self.stalled_groups.lock().unwrap().contains(group) {
            return Ok(());
        }
        let mut states = self.states.lock().unwrap();
        for id in ids {
            states.insert(id.clone(), LifecycleState::Standby);
        }
        Ok(())
    }

    async fn exit_standby(&self, _region: &str, group: &str, ids: &[String]) -> Result<()> {
        self.record(format!("exit_standby:{}:{}", group, ids.join(",")));
        Ok(())
    }

    async fn lifecycle_state(&self, _region: &str, id: &str) -> Result<LifecycleState> {
        self.states
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .ok_or_else(|| anyhow!("unknown resource {}", id))
    }
}

pub fn compute(
    id: &str,
    state: LifecycleState,
    tag: Option<&str>,
    group: Option<&str>,
) -> ComputeResource {
    let mut tags = HashMap::new();
    if let Some(tag) = tag {
        tags.insert("scheduler:startstop".to_string(), tag.to_string());
    }
    ComputeResource {
        id: id.to_string(),
        state,
        tags,
        group: group.map(|g| g.to_string()),
    }
}

pub fn database(id: &str, status: &str, tag: Option<&str>) -> DatabaseResource {
    let mut tags = HashMap::new();
    if let Some(tag) = tag {
        tags.insert("scheduler:db-startstop".to_string(), tag.to_string());
    }
    DatabaseResource {
        id: id.to_string(),
        status: status.to_string(),
        multi_az: false,
        has_read_replicas: false,
        is_read_replica: false,
        tags,
    }
}

/// A stop boundary pinned to the current minute: matches the evaluation
/// window of any cycle run within the next hour at 60m granularity.
pub fn stop_now_tag() -> String {
    format!("none;{}", Utc::now().format("%H%M"))
}

pub fn test_config(regions: &[&str], group_support: bool, database_support: bool) -> Arc<Config> {
    Arc::new(Config {
        schedule: ScheduleConfig {
            default_start_time: "0800".to_string(),
            default_stop_time: "1800".to_string(),
            default_time_zone: "utc".to_string(),
            default_days_active: "all".to_string(),
            tag_key: "scheduler:startstop".to_string(),
            database_tag_key: "scheduler:db-startstop".to_string(),
            granularity_minutes: 60,
        },
        cloud: CloudConfig {
            gateway_url: "http://localhost:9".to_string(),
            api_key: String::new(),
            request_timeout_seconds: 5,
            regions: regions.iter().map(|r| r.to_string()).collect(),
        },
        fleet: FleetConfig {
            group_support,
            poll_interval_seconds: 1,
            poll_timeout_seconds: 5,
        },
        database: DatabaseConfig {
            enabled: database_support,
        },
        metrics: MetricsConfig {
            endpoint: String::new(),
        },
    })
}

pub fn build_controller(api: Arc<MockCloudApi>) -> FleetTransitionController {
    FleetTransitionController::new(
        api as Arc<dyn CloudApi>,
        Duration::from_millis(10),
        Duration::from_millis(300),
    )
}

pub fn build_runner(api: Arc<MockCloudApi>, config: Arc<Config>) -> ScheduleRunner {
    let defaults = ScheduleDefaults::from_config(&config.schedule).expect("valid test defaults");
    let fleet = FleetTransitionController::new(
        api.clone() as Arc<dyn CloudApi>,
        Duration::from_millis(10),
        Duration::from_millis(300),
    );
    ScheduleRunner::new(
        config,
        defaults,
        api as Arc<dyn CloudApi>,
        fleet,
        Arc::new(MetricsSink::new(String::new())),
    )
}
