//! Recurring weekly schedule rules → concrete minute-of-day windows.
//!
//! Each rule contributes one window. Overlapping windows are kept as they
//! are: a request fits if it lies entirely inside any single window.

use chrono::Weekday;
use serde::Serialize;

use crate::model::{ScheduleRule, StaffId};

/// A `[start, end)` span of minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MinuteWindow {
    pub start: u32,
    pub end: u32,
}

impl MinuteWindow {
    /// Whether `[start_min, end_min)` lies entirely inside this window.
    ///
    /// Partial overlap does not count.
    pub fn contains(&self, start_min: u32, end_min: u32) -> bool {
        start_min >= self.start && end_min <= self.end
    }
}

impl From<&ScheduleRule> for MinuteWindow {
    fn from(rule: &ScheduleRule) -> Self {
        let window = MinuteWindow {
            start: rule.start.minute_of_day(),
            end: rule.end.minute_of_day(),
        };
        assert!(
            window.start < window.end,
            "schedule rule for {} on {} starts at {} but ends at {}",
            rule.staff_id,
            rule.weekday,
            rule.start,
            rule.end
        );
        window
    }
}

/// Windows during which `staff_id` works on `weekday`, ascending and de-duplicated.
///
/// An empty result means the staff member does not work that day.
///
/// # Panics
///
/// Panics if a matching rule does not start before it ends. Callers that
/// accept untrusted data should run [`Snapshot::validate`](crate::model::Snapshot::validate) first.
pub fn windows_for(rules: &[ScheduleRule], staff_id: &StaffId, weekday: Weekday) -> Vec<MinuteWindow> {
    let mut windows: Vec<MinuteWindow> = rules
        .iter()
        .filter(|rule| &rule.staff_id == staff_id && rule.weekday == weekday)
        .map(MinuteWindow::from)
        .collect();
    windows.sort_unstable();
    windows.dedup();
    windows
}
