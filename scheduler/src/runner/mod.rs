//! Per-cycle orchestration: evaluate every tagged resource in every region,
//! bucket the verdicts, apply capacity-bounded group transitions, then issue
//! the start/stop calls.
//!
//! Regions are independent and evaluated concurrently; a region's failure
//! is recorded in its report and never aborts its siblings. Partial
//! completion is the expected steady state under failure.

use crate::cloud::CloudApi;
use crate::config::Config;
use crate::fleet::{FleetTransitionController, GroupTransition};
use crate::metrics::MetricsSink;
use crate::schedule::{ScheduleDefaults, ScheduleDescriptor, Verdict, WindowEvaluator};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub region: String,
    /// Tagged resources whose schedule was evaluated this cycle.
    pub evaluated: usize,
    pub started: Vec<String>,
    pub stopped: Vec<String>,
    pub group_transitions: Vec<GroupTransition>,
    pub database_started: Vec<String>,
    pub database_stopped: Vec<String>,
    pub errors: Vec<String>,
}

impl RegionReport {
    fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            evaluated: 0,
            started: Vec::new(),
            stopped: Vec::new(),
            group_transitions: Vec::new(),
            database_started: Vec::new(),
            database_stopped: Vec::new(),
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub regions: Vec<RegionReport>,
    pub errors: Vec<String>,
}

impl CycleReport {
    pub fn total_started(&self) -> usize {
        self.regions
            .iter()
            .map(|r| r.started.len() + r.database_started.len())
            .sum()
    }

    pub fn total_stopped(&self) -> usize {
        self.regions
            .iter()
            .map(|r| r.stopped.len() + r.database_stopped.len())
            .sum()
    }

    pub fn total_errors(&self) -> usize {
        self.errors.len() + self.regions.iter().map(|r| r.errors.len()).sum::<usize>()
    }
}

pub struct ScheduleRunner {
    config: Arc<Config>,
    defaults: ScheduleDefaults,
    evaluator: WindowEvaluator,
    api: Arc<dyn CloudApi>,
    fleet: FleetTransitionController,
    metrics: Arc<MetricsSink>,
}

impl ScheduleRunner {
    pub fn new(
        config: Arc<Config>,
        defaults: ScheduleDefaults,
        api: Arc<dyn CloudApi>,
        fleet: FleetTransitionController,
        metrics: Arc<MetricsSink>,
    ) -> Self {
        let evaluator =
            WindowEvaluator::new(defaults.clone(), config.schedule.granularity_minutes);
        Self {
            config,
            defaults,
            evaluator,
            api,
            fleet,
            metrics,
        }
    }

    pub async fn run_cycle(&self) -> CycleReport {
        let cycle_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let mut errors = Vec::new();

        let regions = match self.resolve_regions().await {
            Ok(regions) => regions,
            Err(e) => {
                error!("Failed to resolve regions: {}", e);
                errors.push(format!("regions: {}", e));
                Vec::new()
            }
        };

        info!("Cycle {} evaluating {} regions", cycle_id, regions.len());

        let reports = join_all(regions.iter().map(|region| self.run_region(region))).await;

        CycleReport {
            cycle_id,
            started_at,
            completed_at: Utc::now(),
            regions: reports,
            errors,
        }
    }

    async fn resolve_regions(&self) -> anyhow::Result<Vec<String>> {
        if self.config.cloud.regions.is_empty() {
            self.api.list_regions().await
        } else {
            Ok(self.config.cloud.regions.clone())
        }
    }

    async fn run_region(&self, region: &str) -> RegionReport {
        let mut report = RegionReport::new(region);

        if let Err(e) = self.run_compute(region, &mut report).await {
            error!("Compute scheduling failed in {}: {}", region, e);
            report.errors.push(format!("compute: {}", e));
        }

        if self.config.database.enabled {
            if let Err(e) = self.run_databases(region, &mut report).await {
                error!("Database scheduling failed in {}: {}", region, e);
                report.errors.push(format!("database: {}", e));
            }
        }

        report
    }

    async fn run_compute(&self, region: &str, report: &mut RegionReport) -> anyhow::Result<()> {
        let resources = self.api.list_compute(region).await?;

        let mut start_list: Vec<String> = Vec::new();
        let mut stop_list: Vec<String> = Vec::new();
        let mut in_service: HashMap<String, Vec<String>> = HashMap::new();
        let mut standby: HashMap<String, Vec<String>> = HashMap::new();
        let group_support = self.config.fleet.group_support;

        for resource in &resources {
            let Some(tag_value) = tag_value(&resource.tags, &self.config.schedule.tag_key)
            else {
                continue;
            };
            report.evaluated += 1;

            self.metrics
                .record_state(region, &resource.id, resource.state.is_running())
                .await;

            let descriptor = ScheduleDescriptor::parse(tag_value, &self.defaults);
            match self.evaluator.verdict(&descriptor) {
                Verdict::Start if resource.state.is_stopped() => {
                    if !start_list.contains(&resource.id) {
                        info!("{} added to start list", resource.id);
                        start_list.push(resource.id.clone());
                        if group_support {
                            if let Some(group) = &resource.group {
                                info!(
                                    "{} is a member of group {}, scheduling return to service",
                                    resource.id, group
                                );
                                in_service
                                    .entry(group.clone())
                                    .or_default()
                                    .push(resource.id.clone());
                            }
                        }
                        self.metrics.record_state(region, &resource.id, true).await;
                    }
                }
                Verdict::Stop if resource.state.is_running() => {
                    if !stop_list.contains(&resource.id) {
                        info!("{} added to stop list", resource.id);
                        stop_list.push(resource.id.clone());
                        if group_support {
                            if let Some(group) = &resource.group {
                                info!(
                                    "{} is a member of group {}, scheduling standby",
                                    resource.id, group
                                );
                                standby
                                    .entry(group.clone())
                                    .or_default()
                                    .push(resource.id.clone());
                            }
                        }
                        self.metrics.record_state(region, &resource.id, false).await;
                    }
                }
                _ => {}
            }
        }

        // Quarantine first: the fleet controller prunes infeasible members
        // from the stop list before any stop call is issued.
        if group_support && !standby.is_empty() {
            let transitions = self.fleet.quarantine(region, standby).await;
            for transition in &transitions {
                for id in &transition.retracted {
                    if let Some(pos) = stop_list.iter().position(|x| x == id) {
                        stop_list.remove(pos);
                        info!(
                            "{} removed from stop list (group {} retraction)",
                            id, transition.group
                        );
                    }
                }
            }
            report.group_transitions.extend(transitions);
        }

        if start_list.is_empty() {
            info!("No compute resources to start in {}", region);
        } else {
            info!(
                "Starting {} compute resources in {}: {:?}",
                start_list.len(),
                region,
                start_list
            );
            self.api.start_compute(region, &start_list).await?;
            report.started = start_list;
        }

        // Return started group members to service only after they report
        // running; the controller gates on that.
        if group_support && !in_service.is_empty() {
            let transitions = self.fleet.unquarantine(region, in_service).await;
            report.group_transitions.extend(transitions);
        }

        if stop_list.is_empty() {
            info!("No compute resources to stop in {}", region);
        } else {
            info!(
                "Stopping {} compute resources in {}: {:?}",
                stop_list.len(),
                region,
                stop_list
            );
            self.api.stop_compute(region, &stop_list).await?;
            report.stopped = stop_list;
        }

        Ok(())
    }

    async fn run_databases(&self, region: &str, report: &mut RegionReport) -> anyhow::Result<()> {
        let databases = self.api.list_databases(region).await?;

        let mut start_list: Vec<String> = Vec::new();
        let mut stop_list: Vec<String> = Vec::new();

        for database in &databases {
            if database.has_read_replicas {
                info!(
                    "No action against database {} (read replicas attached)",
                    database.id
                );
                continue;
            }
            if database.is_read_replica {
                info!(
                    "No action against database {} (replication target)",
                    database.id
                );
                continue;
            }
            if database.multi_az {
                info!("No action against database {} (multi-AZ)", database.id);
                continue;
            }
            if database.status != "available" && database.status != "stopped" {
                info!(
                    "No action against database {} (unsupported status: {})",
                    database.id, database.status
                );
                continue;
            }

            let Some(tag_value) =
                tag_value(&database.tags, &self.config.schedule.database_tag_key)
            else {
                continue;
            };
            report.evaluated += 1;

            let descriptor = ScheduleDescriptor::parse(tag_value, &self.defaults);
            match self.evaluator.verdict(&descriptor) {
                Verdict::Start if database.status == "stopped" => {
                    if !start_list.contains(&database.id) {
                        info!("{} added to database start list", database.id);
                        start_list.push(database.id.clone());
                    }
                }
                Verdict::Stop if database.status == "available" => {
                    if !stop_list.contains(&database.id) {
                        info!("{} added to database stop list", database.id);
                        stop_list.push(database.id.clone());
                    }
                }
                _ => {}
            }
        }

        if start_list.is_empty() && stop_list.is_empty() {
            info!("No database actions in {}", region);
            return Ok(());
        }

        // Database transitions are per-identifier; one failure must not
        // drop the rest of the batch.
        for id in &start_list {
            match self.api.start_database(region, id).await {
                Ok(()) => report.database_started.push(id.clone()),
                Err(e) => {
                    error!("Failed to start database {}: {}", id, e);
                    report.errors.push(format!("database {}: {}", id, e));
                }
            }
        }

        for id in &stop_list {
            match self.api.stop_database(region, id).await {
                Ok(()) => report.database_stopped.push(id.clone()),
                Err(e) => {
                    error!("Failed to stop database {}: {}", id, e);
                    report.errors.push(format!("database {}: {}", id, e));
                }
            }
        }

        Ok(())
    }
}

/// The schedule tag is recognized by key prefix.
fn tag_value<'a>(tags: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|(k, _)| k.starts_with(key))
        .map(|(_, v)| v.as_str())
}
