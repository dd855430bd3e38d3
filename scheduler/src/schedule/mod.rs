//! Tag-driven schedule evaluation
//!
//! A schedule is re-derived from scratch every cycle: the raw tag string is
//! parsed into a [`ScheduleDescriptor`], the current wall clock is localized
//! to the descriptor's zone, and the evaluator reduces both to a single
//! [`Verdict`]. Nothing is cached between cycles.

pub mod days;
pub mod tag;
pub mod window;

pub use tag::ScheduleDescriptor;
pub use window::{EvaluationWindow, WindowEvaluator, GRANULARITIES};

use crate::config::ScheduleConfig;
use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one descriptor in one cycle.
///
/// Start and stop are mutually exclusive: a schedule whose start and stop
/// windows overlap the same cycle resolves to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Start,
    Stop,
    None,
}

/// Process-wide schedule defaults, fixed once per cycle invocation and
/// threaded explicitly through the parser and evaluator.
#[derive(Debug, Clone)]
pub struct ScheduleDefaults {
    pub start_time: String,
    pub stop_time: String,
    pub time_zone_name: String,
    pub time_zone: Tz,
    pub days_active: String,
}

impl ScheduleDefaults {
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        let time_zone = resolve_time_zone(&config.default_time_zone).ok_or_else(|| {
            anyhow!(
                "Unsupported default time zone: {}",
                config.default_time_zone
            )
        })?;

        Ok(Self {
            start_time: config.default_start_time.clone(),
            stop_time: config.default_stop_time.clone(),
            time_zone_name: config.default_time_zone.clone(),
            time_zone,
            days_active: config.default_days_active.to_lowercase(),
        })
    }
}

/// Named-zone lookup, case-sensitive apart from the literal "utc".
pub fn resolve_time_zone(name: &str) -> Option<Tz> {
    if name.eq_ignore_ascii_case("utc") {
        return Some(Tz::UTC);
    }
    name.parse().ok()
}

/// "none" and the empty string both mean the time field is absent.
pub(crate) fn is_absent(time: &str) -> bool {
    time.is_empty() || time == "none"
}
