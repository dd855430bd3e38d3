use super::{GroupTransition, TransitionOutcome, WaitState};
use crate::cloud::{CloudApi, LifecycleState};
use anyhow::Result;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Converts batches of stop/start decisions for grouped members into
/// capacity-bounded standby transitions and blocks until convergence.
///
/// Groups are independent: they are processed concurrently, and one group's
/// failure never aborts the others.
pub struct FleetTransitionController {
    api: Arc<dyn CloudApi>,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl FleetTransitionController {
    pub fn new(api: Arc<dyn CloudApi>, poll_interval: Duration, poll_timeout: Duration) -> Self {
        Self {
            api,
            poll_interval,
            poll_timeout,
        }
    }

    /// Move stop-bound members of each group to standby, bounded by the
    /// group's capacity floor. Members that cannot be quarantined this
    /// cycle come back in the `retracted` set and must stay running.
    pub async fn quarantine(
        &self,
        region: &str,
        groups: HashMap<String, Vec<String>>,
    ) -> Vec<GroupTransition> {
        let tasks = groups
            .into_iter()
            .map(|(group, members)| self.quarantine_group(region, group, members));
        join_all(tasks).await
    }

    async fn quarantine_group(
        &self,
        region: &str,
        group: String,
        members: Vec<String>,
    ) -> GroupTransition {
        let capacity = match self.api.group_capacity(region, &group).await {
            Ok(capacity) => capacity,
            Err(e) => {
                error!("Failed to read capacity for group {}: {}", group, e);
                return GroupTransition {
                    group,
                    transitioned: Vec::new(),
                    retracted: members,
                    outcome: TransitionOutcome::Failed(e.to_string()),
                };
            }
        };

        let max_quarantine = capacity.max_quarantine() as usize;
        if max_quarantine == 0 {
            warn!(
                "Group {} is at its capacity floor (desired: {}, min: {}), keeping all {} members running",
                group,
                capacity.desired_capacity,
                capacity.min_size,
                members.len()
            );
            return GroupTransition {
                group,
                transitioned: Vec::new(),
                retracted: members,
                outcome: TransitionOutcome::CapacityFloor,
            };
        }

        // stable upstream order: keep the first max_quarantine members
        let mut retained = members;
        let excess = if retained.len() > max_quarantine {
            retained.split_off(max_quarantine)
        } else {
            Vec::new()
        };
        if !excess.is_empty() {
            warn!(
                "Group {} can only stand by {} of {} members this cycle",
                group,
                retained.len(),
                retained.len() + excess.len()
            );
        }

        if let Err(e) = self.api.enter_standby(region, &group, &retained).await {
            error!(
                "Failed to move {} members of group {} to standby: {}",
                retained.len(),
                group,
                e
            );
            let mut retracted = retained;
            retracted.extend(excess);
            return GroupTransition {
                group,
                transitioned: Vec::new(),
                retracted,
                outcome: TransitionOutcome::Failed(e.to_string()),
            };
        }

        // Downstream stop calls must not race the group controller, so
        // block here until every retained member reports standby.
        match self
            .wait_for_state(region, &retained, LifecycleState::Standby)
            .await
        {
            WaitState::Converged => {
                info!(
                    "Group {}: {} members in standby, {} retracted",
                    group,
                    retained.len(),
                    excess.len()
                );
                GroupTransition {
                    group,
                    transitioned: retained,
                    retracted: excess,
                    outcome: TransitionOutcome::Applied,
                }
            }
            WaitState::TimedOut => {
                error!("Group {}: standby transition did not converge in time", group);
                let mut retracted = retained;
                retracted.extend(excess);
                GroupTransition {
                    group,
                    transitioned: Vec::new(),
                    retracted,
                    outcome: TransitionOutcome::TimedOut,
                }
            }
            WaitState::Failed | WaitState::Pending => {
                let mut retracted = retained;
                retracted.extend(excess);
                GroupTransition {
                    group,
                    transitioned: Vec::new(),
                    retracted,
                    outcome: TransitionOutcome::Failed("standby state polling failed".to_string()),
                }
            }
        }
    }

    /// Return started members to active rotation, confirming each has
    /// reached running first: the group controller must not receive a
    /// not-yet-running member as back in service.
    pub async fn unquarantine(
        &self,
        region: &str,
        groups: HashMap<String, Vec<String>>,
    ) -> Vec<GroupTransition> {
        let tasks = groups
            .into_iter()
            .map(|(group, members)| self.unquarantine_group(region, group, members));
        join_all(tasks).await
    }

    async fn unquarantine_group(
        &self,
        region: &str,
        group: String,
        members: Vec<String>,
    ) -> GroupTransition {
        let mut returned = Vec::new();
        let mut retracted = Vec::new();
        let mut first_error: Option<String> = None;

        for member in members {
            let member_slice = std::slice::from_ref(&member);
            match self
                .wait_for_state(region, member_slice, LifecycleState::Running)
                .await
            {
                WaitState::Converged => {
                    match self.api.exit_standby(region, &group, member_slice).await {
                        Ok(()) => {
                            info!("{} returned to service in group {}", member, group);
                            returned.push(member);
                        }
                        Err(e) => {
                            error!(
                                "Failed to return {} to service in group {}: {}",
                                member, group, e
                            );
                            if first_error.is_none() {
                                first_error = Some(e.to_string());
                            }
                            retracted.push(member);
                        }
                    }
                }
                state => {
                    warn!(
                        "{} in group {} never reached running ({:?}), leaving in standby",
                        member, group, state
                    );
                    retracted.push(member);
                }
            }
        }

        let outcome = if retracted.is_empty() {
            TransitionOutcome::Applied
        } else if let Some(e) = first_error {
            TransitionOutcome::Failed(e)
        } else {
            TransitionOutcome::TimedOut
        };

        GroupTransition {
            group,
            transitioned: returned,
            retracted,
            outcome,
        }
    }

    /// Bounded convergence wait: Pending until every id reports the target
    /// state (Converged), the timeout elapses (TimedOut), or polling itself
    /// errors (Failed).
    async fn wait_for_state(
        &self,
        region: &str,
        ids: &[String],
        target: LifecycleState,
    ) -> WaitState {
        if ids.is_empty() {
            return WaitState::Converged;
        }

        let poll = async {
            let mut ticker = tokio::time::interval(self.poll_interval);
            loop {
                ticker.tick().await;
                match self.all_in_state(region, ids, target).await {
                    Ok(true) => return WaitState::Converged,
                    Ok(false) => {
                        // still pending, keep polling
                    }
                    Err(e) => {
                        error!("Lifecycle polling failed: {}", e);
                        return WaitState::Failed;
                    }
                }
            }
        };

        match timeout(self.poll_timeout, poll).await {
            Ok(state) => state,
            Err(_) => WaitState::TimedOut,
        }
    }

    async fn all_in_state(
        &self,
        region: &str,
        ids: &[String],
        target: LifecycleState,
    ) -> Result<bool> {
        for id in ids {
            if self.api.lifecycle_state(region, id).await? != target {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
