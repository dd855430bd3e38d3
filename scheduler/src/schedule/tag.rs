use super::{is_absent, resolve_time_zone, ScheduleDefaults};
use chrono_tz::Tz;
use tracing::warn;

/// Parsed form of one schedule tag value.
///
/// The grammar is `start[:stop[:zone[:days]]]` with `:` and `;` treated
/// interchangeably. It is total over all strings: absent or malformed
/// fields keep their defaults and parsing never fails.
#[derive(Debug, Clone)]
pub struct ScheduleDescriptor {
    /// 4-digit HHMM, "none"/"" for absent, or the literals "24x7"/"24x5".
    pub start_time: String,
    pub stop_time: String,
    pub time_zone: Tz,
    /// Set when the tag named a zone the zone database does not know.
    /// Forces the verdict to none regardless of any time match.
    pub invalid_time_zone: bool,
    /// Lower-cased day spec: "all", "weekdays", or comma-separated tokens.
    pub days_active: String,
}

impl ScheduleDescriptor {
    pub fn parse(tag_value: &str, defaults: &ScheduleDefaults) -> Self {
        let fields: Vec<&str> = tag_value.split([':', ';']).collect();

        let mut start_time = defaults.start_time.clone();
        let mut stop_time = defaults.stop_time.clone();
        let mut time_zone = defaults.time_zone;
        let mut invalid_time_zone = false;
        let mut days_active = defaults.days_active.clone();

        if let Some(first) = fields.first() {
            if first.eq_ignore_ascii_case("default") || first.eq_ignore_ascii_case("true") {
                // keep the configured default start and stop
            } else {
                start_time = first.to_string();
                if fields.len() < 2 {
                    // single-value tags mean an instantaneous window, the
                    // same instant for both boundaries
                    stop_time = first.to_string();
                }
            }
        }

        if let Some(second) = fields.get(1) {
            stop_time = second.to_string();
        }

        if let Some(third) = fields.get(2) {
            if !third.is_empty() && *third != defaults.time_zone_name {
                match resolve_time_zone(third) {
                    Some(zone) => time_zone = zone,
                    None => {
                        warn!("Invalid time zone in schedule tag: {}", third);
                        invalid_time_zone = true;
                    }
                }
            }
        }

        if let Some(fourth) = fields.get(3) {
            days_active = fourth.to_lowercase();
        }

        Self {
            start_time,
            stop_time,
            time_zone,
            invalid_time_zone,
            days_active,
        }
    }

    /// Tagged but closed: both boundary times absent means the descriptor
    /// evaluates to none without any time matching.
    pub fn is_unscheduled(&self) -> bool {
        is_absent(&self.start_time) && is_absent(&self.stop_time)
    }
}
