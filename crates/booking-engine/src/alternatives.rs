//! Suggest nearby free start times when the requested one cannot be honored.
//!
//! The search walks a fixed grid of start times across the requested local
//! day (by default 09:00 to 19:00 in 30-minute steps). For each grid slot the
//! candidates are probed with the same first-fit rule as auto-assignment, and
//! the first few slots someone can take are returned as customer-facing labels
//! such as `"10:30 AM"`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::assign::assign;
use crate::conflict::{ConflictDetector, Slot};
use crate::model::StaffId;
use crate::time::{resolve_interval, TimeOfDay};

/// The daily grid alternatives are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotGrid {
    /// Earliest start time offered.
    pub open: TimeOfDay,
    /// No suggested slot may end after this time.
    pub close: TimeOfDay,
    pub step_minutes: u32,
    /// Maximum number of alternatives returned.
    pub max_results: usize,
}

impl Default for SlotGrid {
    fn default() -> Self {
        SlotGrid {
            open: TimeOfDay::hm(9, 0),
            close: TimeOfDay::hm(19, 0),
            step_minutes: 30,
            max_results: 3,
        }
    }
}

impl SlotGrid {
    /// Grid start times, in order, for which a `duration_minutes` slot ends by `close`.
    pub fn starts(&self, duration_minutes: u32) -> impl Iterator<Item = TimeOfDay> {
        let close = self.close.minute_of_day();
        let step = self.step_minutes.max(1) as usize;
        (self.open.minute_of_day()..close)
            .step_by(step)
            .take_while(move |start| start.saturating_add(duration_minutes) <= close)
            .filter_map(TimeOfDay::from_minute_of_day)
    }
}

/// Up to `grid.max_results` free start times on `date`, as local labels.
///
/// Slots are probed in chronological order; a slot counts as soon as any
/// candidate can take it. `excluded` (the originally requested time) is never
/// suggested. Grid times that do not exist on `date` because of a DST jump
/// are skipped.
pub fn find_alternatives(
    detector: &ConflictDetector<'_>,
    date: NaiveDate,
    duration_minutes: u32,
    candidates: &[StaffId],
    grid: &SlotGrid,
    excluded: Option<TimeOfDay>,
) -> Vec<String> {
    let tz = detector.timezone();
    let mut found: Vec<String> = Vec::new();

    for start in grid.starts(duration_minutes) {
        if found.len() >= grid.max_results {
            break;
        }
        if excluded == Some(start) {
            continue;
        }
        let interval = match resolve_interval(date, start, duration_minutes, tz) {
            Ok(interval) => interval,
            Err(err) => {
                trace!(%start, %err, "skipping grid slot");
                continue;
            }
        };
        if assign(detector, candidates, &Slot::resolve(interval, tz)).is_some() {
            let label = start.label();
            if !found.contains(&label) {
                found.push(label);
            }
        }
    }

    debug!(%date, duration_minutes, alternatives = ?found, "alternative search");
    found
}
