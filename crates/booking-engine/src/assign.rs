//! Deterministic first-fit staff assignment.

use tracing::debug;

use crate::conflict::{ConflictDetector, Slot};
use crate::model::{StaffId, StaffMember};

/// Candidate order for auto-assignment: active members only, sorted by name
/// with the id as tie-break so identical inputs always give the same order.
pub fn order_candidates<'s, I>(staff: I) -> Vec<StaffId>
where
    I: IntoIterator<Item = &'s StaffMember>,
{
    let mut active: Vec<&StaffMember> = staff.into_iter().filter(|s| s.active).collect();
    active.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    active.into_iter().map(|s| s.id.clone()).collect()
}

/// The first candidate, in the given order, who is free for `slot`.
///
/// Returns `None` when nobody is free; that is an ordinary answer, not an
/// error.
pub fn assign(detector: &ConflictDetector<'_>, candidates: &[StaffId], slot: &Slot) -> Option<StaffId> {
    let winner = candidates
        .iter()
        .find(|staff_id| detector.check(staff_id, slot).is_free())
        .cloned();
    debug!(
        interval = %slot.interval,
        candidates = candidates.len(),
        assigned = ?winner.as_ref().map(StaffId::as_str),
        "auto-assign"
    );
    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Appointment, AppointmentStatus, BookingSource, ScheduleRule, Snapshot};
    use crate::time::{parse_timezone, resolve_interval, UtcInterval};
    use chrono::{NaiveDate, Weekday};
    use chrono_tz::Tz;

    fn tz() -> Tz {
        parse_timezone("Europe/London").unwrap()
    }

    fn at(time: &str, minutes: u32) -> UtcInterval {
        let monday = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
        resolve_interval(monday, time.parse().unwrap(), minutes, tz()).unwrap()
    }

    fn member(id: &str, name: &str, active: bool) -> StaffMember {
        StaffMember {
            id: id.into(),
            tenant_id: "salon".into(),
            name: name.to_string(),
            active,
        }
    }

    fn working(staff: &[&str]) -> Snapshot {
        Snapshot {
            rules: staff
                .iter()
                .map(|s| ScheduleRule {
                    staff_id: (*s).into(),
                    weekday: Weekday::Mon,
                    start: "09:00".parse().unwrap(),
                    end: "17:00".parse().unwrap(),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn booked(staff: &str, interval: UtcInterval) -> Appointment {
        Appointment {
            id: format!("{staff}-booking").as_str().into(),
            tenant_id: "salon".into(),
            staff_id: staff.into(),
            service_id: "cut".into(),
            start: interval.start,
            end: interval.end,
            status: AppointmentStatus::Confirmed,
            source: BookingSource::Manual,
            notes: None,
        }
    }

    #[test]
    fn test_order_drops_inactive_and_sorts_by_name_then_id() {
        let staff = vec![
            member("b-2", "Taylor", true),
            member("a-1", "Alex", true),
            member("z-9", "Jordan", false),
            member("a-0", "Taylor", true),
        ];
        let order = order_candidates(&staff);
        assert_eq!(
            order,
            vec![StaffId::from("a-1"), StaffId::from("a-0"), StaffId::from("b-2")]
        );
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let mut staff = vec![
            member("x", "Sam", true),
            member("y", "Ari", true),
            member("z", "Sam", true),
        ];
        let first = order_candidates(&staff);
        staff.reverse();
        assert_eq!(order_candidates(&staff), first);
    }

    #[test]
    fn test_first_free_candidate_wins() {
        let interval = at("10:00", 30);
        let mut snap = working(&["x", "y"]);
        snap.appointments.push(booked("x", interval));
        let detector = ConflictDetector::new(&snap, tz());
        let slot = Slot::resolve(interval, tz());

        let candidates = vec![StaffId::from("x"), StaffId::from("y")];
        assert_eq!(assign(&detector, &candidates, &slot), Some("y".into()));
    }

    #[test]
    fn test_order_decides_between_free_candidates() {
        let snap = working(&["x", "y"]);
        let detector = ConflictDetector::new(&snap, tz());
        let slot = Slot::resolve(at("10:00", 30), tz());

        let xy = vec![StaffId::from("x"), StaffId::from("y")];
        let yx = vec![StaffId::from("y"), StaffId::from("x")];
        assert_eq!(assign(&detector, &xy, &slot), Some("x".into()));
        assert_eq!(assign(&detector, &yx, &slot), Some("y".into()));
    }

    #[test]
    fn test_none_when_nobody_free() {
        let interval = at("10:00", 30);
        let mut snap = working(&["x"]);
        snap.appointments.push(booked("x", interval));
        let detector = ConflictDetector::new(&snap, tz());
        let slot = Slot::resolve(interval, tz());

        assert_eq!(assign(&detector, &[StaffId::from("x")], &slot), None);
        assert_eq!(assign(&detector, &[], &slot), None);
    }

    #[test]
    fn test_assignment_is_repeatable() {
        let snap = working(&["x", "y", "z"]);
        let detector = ConflictDetector::new(&snap, tz());
        let slot = Slot::resolve(at("11:00", 45), tz());
        let candidates = vec![StaffId::from("z"), StaffId::from("x"), StaffId::from("y")];

        let first = assign(&detector, &candidates, &slot);
        let second = assign(&detector, &candidates, &slot);
        assert_eq!(first, second);
        assert_eq!(first, Some("z".into()));
    }
}
