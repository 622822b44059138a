//! Decide whether one staff member can take a requested interval.
//!
//! Three independent gates, all of which must pass:
//!
//! 1. **Schedule** — the request, in local time, fits entirely inside one of
//!    the staff member's windows for the local weekday.
//! 2. **Appointments** — no tentative or confirmed appointment overlaps it.
//! 3. **Time off** — no time-off entry overlaps it.
//!
//! Overlap is the half-open test from [`UtcInterval::overlaps`]; adjacent
//! intervals are not conflicts.

use chrono::Weekday;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::trace;

use crate::model::{AppointmentId, Snapshot, StaffId};
use crate::schedule::windows_for;
use crate::time::{to_local, UtcInterval};

/// A requested interval together with where it falls on the local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub interval: UtcInterval,
    /// Local weekday of `interval.start`; selects which weekly rules apply.
    pub weekday: Weekday,
    /// Local minute-of-day of `interval.start`.
    pub start_minute: u32,
}

impl Slot {
    /// Place `interval` on the local calendar of `tz`.
    pub fn resolve(interval: UtcInterval, tz: Tz) -> Self {
        let local = to_local(interval.start, tz);
        Slot {
            interval,
            weekday: local.weekday,
            start_minute: local.time.minute_of_day(),
        }
    }

    /// Local end minute. May exceed 1440 for a request running past
    /// midnight, which no window can contain. Saturates instead of wrapping.
    pub fn end_minute(&self) -> u32 {
        let length = u32::try_from(self.interval.duration_minutes()).unwrap_or(u32::MAX);
        self.start_minute.saturating_add(length)
    }
}

/// Outcome of checking one staff member against one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    Free,
    OutsideSchedule,
    AppointmentOverlap(AppointmentId),
    TimeOffOverlap,
}

impl Verdict {
    pub fn is_free(&self) -> bool {
        matches!(self, Verdict::Free)
    }
}

/// Read-only conflict checks over one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector<'a> {
    snapshot: &'a Snapshot,
    tz: Tz,
}

impl<'a> ConflictDetector<'a> {
    /// `tz` is the zone whose wall clock the weekly schedule rules are written in.
    pub fn new(snapshot: &'a Snapshot, tz: Tz) -> Self {
        ConflictDetector { snapshot, tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Whether `staff_id` can take `interval`.
    pub fn is_free(&self, staff_id: &StaffId, interval: &UtcInterval) -> bool {
        self.check(staff_id, &Slot::resolve(*interval, self.tz))
            .is_free()
    }

    /// Run the three gates in order and report the first that fails.
    pub fn check(&self, staff_id: &StaffId, slot: &Slot) -> Verdict {
        let windows = windows_for(&self.snapshot.rules, staff_id, slot.weekday);
        let (start_min, end_min) = (slot.start_minute, slot.end_minute());
        if !windows.iter().any(|w| w.contains(start_min, end_min)) {
            trace!(%staff_id, weekday = %slot.weekday, start_min, end_min, "outside schedule");
            return Verdict::OutsideSchedule;
        }

        if let Some(appt) = self.snapshot.appointments.iter().find(|a| {
            &a.staff_id == staff_id
                && a.status.occupies_timeline()
                && a.interval().overlaps(&slot.interval)
        }) {
            trace!(%staff_id, appointment = %appt.id, "overlaps appointment");
            return Verdict::AppointmentOverlap(appt.id.clone());
        }

        if self
            .snapshot
            .time_off
            .iter()
            .any(|t| &t.staff_id == staff_id && t.interval().overlaps(&slot.interval))
        {
            trace!(%staff_id, "overlaps time off");
            return Verdict::TimeOffOverlap;
        }

        Verdict::Free
    }
}
