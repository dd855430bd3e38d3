//! Capacity-bounded fleet transitions for elastic-group members.

pub mod controller;
pub use controller::FleetTransitionController;

use serde::{Deserialize, Serialize};

/// States of the bounded convergence wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitState {
    Pending,
    Converged,
    TimedOut,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionOutcome {
    /// Transition issued and converged for every retained member.
    Applied,
    /// The group cannot give up any member without breaching its minimum
    /// size; no transition was issued.
    CapacityFloor,
    TimedOut,
    Failed(String),
}

/// Immutable per-group result. Retracted members must not be acted on by
/// the caller this cycle; the caller is the single writer of the overall
/// stop list and prunes it from these sets after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTransition {
    pub group: String,
    pub transitioned: Vec<String>,
    pub retracted: Vec<String>,
    pub outcome: TransitionOutcome,
}
