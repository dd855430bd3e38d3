//! Window evaluation: reduces a descriptor and the current wall clock to a
//! single verdict per cycle, including the midnight boundary correction.

use super::days::is_active_day;
use super::{is_absent, ScheduleDefaults, ScheduleDescriptor, Verdict};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

/// Supported evaluation granularities in minutes.
pub const GRANULARITIES: [u32; 4] = [5, 15, 30, 60];

/// The per-descriptor look-back window, derived from the instant localized
/// to the descriptor's zone.
///
/// All times are zero-padded 4-digit HHMM strings, so lexicographic
/// comparison and numeric comparison agree.
#[derive(Debug, Clone)]
pub struct EvaluationWindow {
    pub now: String,
    /// `now - granularity + 1` minute. Clamped at "0000" inside the first
    /// hour of the day; keeps its wrapped previous-day value only when
    /// `now` is exactly "0000", where the midnight branch consumes it.
    pub window_start: String,
    pub today: String,
    pub day_of_month: u32,
    pub yesterday: String,
    pub yesterday_day_of_month: u32,
}

impl EvaluationWindow {
    pub fn from_local(local: DateTime<Tz>, granularity_minutes: u32) -> Self {
        let minute_of_day = local.hour() * 60 + local.minute();
        let look_back = granularity_minutes.saturating_sub(1);

        let window_start = if minute_of_day == 0 {
            // wrapped tail of yesterday, e.g. 2301 for a 60 minute cycle
            format_hhmm(24 * 60 - look_back)
        } else {
            format_hhmm(minute_of_day.saturating_sub(look_back))
        };

        let previous = local - Duration::days(1);

        Self {
            now: format_hhmm(minute_of_day),
            window_start,
            today: local.format("%a").to_string().to_lowercase(),
            day_of_month: local.day(),
            yesterday: previous.format("%a").to_string().to_lowercase(),
            yesterday_day_of_month: previous.day(),
        }
    }
}

fn format_hhmm(minute_of_day: u32) -> String {
    format!("{:02}{:02}", minute_of_day / 60, minute_of_day % 60)
}

fn time_in_window(time: &str, window_start: &str, now: &str) -> bool {
    !is_absent(time) && time >= window_start && time <= now
}

/// One side of a descriptor resolved for a concrete day: the effective
/// boundary times and whether that day is active.
struct DaySchedule {
    start: String,
    stop: String,
    active: bool,
}

pub struct WindowEvaluator {
    defaults: ScheduleDefaults,
    granularity_minutes: u32,
}

impl WindowEvaluator {
    pub fn new(defaults: ScheduleDefaults, granularity_minutes: u32) -> Self {
        Self {
            defaults,
            granularity_minutes,
        }
    }

    pub fn verdict(&self, descriptor: &ScheduleDescriptor) -> Verdict {
        self.verdict_at(descriptor, Utc::now())
    }

    pub fn verdict_at(&self, descriptor: &ScheduleDescriptor, instant: DateTime<Utc>) -> Verdict {
        let local = instant.with_timezone(&descriptor.time_zone);
        let window = EvaluationWindow::from_local(local, self.granularity_minutes);
        self.verdict_in_window(descriptor, &window)
    }

    pub fn verdict_in_window(
        &self,
        descriptor: &ScheduleDescriptor,
        window: &EvaluationWindow,
    ) -> Verdict {
        // Unconditional, before any other check
        if descriptor.start_time == "24x7" {
            return Verdict::Start;
        }

        if descriptor.is_unscheduled() {
            return Verdict::None;
        }

        // Never act on an unverifiable local time
        if descriptor.invalid_time_zone {
            debug!("Schedule ignored: unresolved time zone");
            return Verdict::None;
        }

        let (start_hit, stop_hit) = if window.now == "0000" {
            self.midnight_hits(descriptor, window)
        } else {
            let day = self.day_schedule(descriptor, &window.today, window.day_of_month);
            (
                day.active && time_in_window(&day.start, &window.window_start, &window.now),
                day.active && time_in_window(&day.stop, &window.window_start, &window.now),
            )
        };

        match (start_hit, stop_hit) {
            (true, true) => {
                warn!(
                    "Ambiguous schedule: start {} and stop {} both fall in the current window",
                    descriptor.start_time, descriptor.stop_time
                );
                Verdict::None
            }
            (true, false) => Verdict::Start,
            (false, true) => Verdict::Stop,
            (false, false) => Verdict::None,
        }
    }

    /// At exactly 00:00 the look-back window wraps into yesterday. A
    /// boundary time of "0000" matches today's degenerate window; any other
    /// boundary time matches the wrapped tail, with day activity re-derived
    /// against yesterday and the comparison pinned to 23:59.
    fn midnight_hits(&self, descriptor: &ScheduleDescriptor, window: &EvaluationWindow) -> (bool, bool) {
        let today = self.day_schedule(descriptor, &window.today, window.day_of_month);
        let yesterday = self.day_schedule(
            descriptor,
            &window.yesterday,
            window.yesterday_day_of_month,
        );

        let hit = |today_time: &str, yesterday_time: &str| {
            if today_time == "0000" && today.active {
                return true;
            }
            yesterday.active
                && yesterday_time != "0000"
                && time_in_window(yesterday_time, &window.window_start, "2359")
        };

        (
            hit(&today.start, &yesterday.start),
            hit(&today.stop, &yesterday.stop),
        )
    }

    fn day_schedule(&self, descriptor: &ScheduleDescriptor, day: &str, day_of_month: u32) -> DaySchedule {
        // 24x5 derives its boundaries from the day itself and bypasses the
        // day-spec matcher: start Monday, stop Friday
        if descriptor.start_time == "24x5" {
            return match day {
                "mon" => DaySchedule {
                    start: self.defaults.start_time.clone(),
                    stop: "none".to_string(),
                    active: true,
                },
                "fri" => DaySchedule {
                    start: "none".to_string(),
                    stop: self.defaults.stop_time.clone(),
                    active: true,
                },
                _ => DaySchedule {
                    start: "none".to_string(),
                    stop: "none".to_string(),
                    active: false,
                },
            };
        }

        DaySchedule {
            start: descriptor.start_time.clone(),
            stop: descriptor.stop_time.clone(),
            active: is_active_day(&descriptor.days_active, day, day_of_month),
        }
    }
}
