//! Availability and auto-assignment over a [`BookingStore`].
//!
//! Each call reads one snapshot from the store, then decides without further
//! I/O. A positive answer is advisory: it was true when the snapshot was read,
//! and only [`BookingStore::commit_appointment`] makes it binding.

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::alternatives::find_alternatives;
use crate::assign::assign;
use crate::config::EngineConfig;
use crate::conflict::{ConflictDetector, Slot};
use crate::error::{BookingError, Result};
use crate::model::{ServiceId, Snapshot, StaffId, TenantId};
use crate::store::BookingStore;
use crate::time::{local_day_bounds, parse_timezone, resolve_interval, TimeOfDay, UtcInterval};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub tenant_id: TenantId,
    pub date: NaiveDate,
    pub time_of_day: TimeOfDay,
    pub duration_minutes: u32,
    /// Overrides the tenant's timezone when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Only consider this staff member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<StaffId>,
    /// Only consider staff who perform this service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<ServiceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<StaffId>,
    /// Up to three local start-time labels, empty when `available`.
    pub alternatives: Vec<String>,
}

/// A booking whose interval and local placement the caller already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAssignRequest {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub utc_start: chrono::DateTime<chrono::Utc>,
    pub utc_end: chrono::DateTime<chrono::Utc>,
    pub local_weekday: Weekday,
    pub local_time_of_day: TimeOfDay,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAssignResult {
    pub staff_id: Option<StaffId>,
}

/// An availability answer with the interval it was computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Evaluation {
    pub result: AvailabilityResult,
    pub interval: UtcInterval,
}

/// Can the requested slot be honored, and by whom?
///
/// With an explicit `staff_id` only that member is considered; otherwise
/// every active member of the tenant (able to perform `service_id`, when
/// given) is tried in stable order. When nobody is free the result carries
/// up to `config.grid.max_results` alternative start times on the same day.
///
/// # Errors
///
/// [`BookingError::TenantNotFound`], [`BookingError::StaffNotFound`] and
/// [`BookingError::ServiceNotFound`] for failed lookups;
/// [`BookingError::InvalidTimezone`], [`BookingError::InvalidDuration`] and
/// [`BookingError::NonexistentLocalTime`] for requests that cannot be placed
/// on the timeline; [`BookingError::MalformedSnapshot`] if the store returns
/// inconsistent rows.
pub fn check_availability<S>(
    store: &S,
    request: &AvailabilityRequest,
    config: &EngineConfig,
) -> Result<AvailabilityResult>
where
    S: BookingStore + ?Sized,
{
    evaluate(store, request, config).map(|evaluation| evaluation.result)
}

pub(crate) fn evaluate<S>(store: &S, request: &AvailabilityRequest, config: &EngineConfig) -> Result<Evaluation>
where
    S: BookingStore + ?Sized,
{
    let tz = request_timezone(store, &request.tenant_id, request.timezone.as_deref())?;
    let interval = resolve_interval(request.date, request.time_of_day, request.duration_minutes, tz)?;
    let candidates = candidates_for(store, request)?;

    let slot = Slot::resolve(interval, tz);
    let range = local_day_bounds(request.date, tz)?.cover(&interval);
    let snapshot = load_checked(store, &candidates, slot.weekday, &range)?;
    let detector = ConflictDetector::new(&snapshot, tz);

    let result = match assign(&detector, &candidates, &slot) {
        Some(staff_id) => AvailabilityResult {
            available: true,
            staff_id: Some(staff_id),
            alternatives: Vec::new(),
        },
        None => AvailabilityResult {
            available: false,
            staff_id: None,
            alternatives: find_alternatives(
                &detector,
                request.date,
                request.duration_minutes,
                &candidates,
                &config.grid,
                Some(request.time_of_day),
            ),
        },
    };
    debug!(
        tenant_id = %request.tenant_id,
        %interval,
        available = result.available,
        "availability checked"
    );
    Ok(Evaluation { result, interval })
}

/// Pick the first free staff member able to perform the service.
///
/// The schedule gate uses `local_weekday` and `local_time_of_day` from the
/// request as given.
///
/// # Errors
///
/// [`BookingError::ServiceNotFound`] if the service is not offered by the
/// tenant, [`BookingError::InvalidDuration`] if `utc_end` is not
/// `duration_minutes` after `utc_start`.
pub fn auto_assign<S>(store: &S, request: &AutoAssignRequest) -> Result<AutoAssignResult>
where
    S: BookingStore + ?Sized,
{
    store.service(&request.tenant_id, &request.service_id)?;
    let tz = request_timezone(store, &request.tenant_id, None)?;

    let interval = UtcInterval::new(request.utc_start, request.utc_end);
    if !interval.is_well_formed() || interval.duration_minutes() != i64::from(request.duration_minutes) {
        return Err(BookingError::InvalidDuration(format!(
            "{interval} does not last {} minutes",
            request.duration_minutes
        )));
    }

    let candidates = store.list_candidate_staff(&request.tenant_id, Some(&request.service_id))?;
    let snapshot = load_checked(store, &candidates, request.local_weekday, &interval)?;
    let detector = ConflictDetector::new(&snapshot, tz);
    let slot = Slot {
        interval,
        weekday: request.local_weekday,
        start_minute: request.local_time_of_day.minute_of_day(),
    };

    Ok(AutoAssignResult {
        staff_id: assign(&detector, &candidates, &slot),
    })
}

fn candidates_for<S>(store: &S, request: &AvailabilityRequest) -> Result<Vec<StaffId>>
where
    S: BookingStore + ?Sized,
{
    match &request.staff_id {
        Some(staff_id) => {
            let member = store.staff_member(&request.tenant_id, staff_id)?;
            if !member.active {
                return Err(BookingError::StaffNotFound(staff_id.clone()));
            }
            if let Some(service_id) = &request.service_id {
                let service = store.service(&request.tenant_id, service_id)?;
                if !service.is_performed_by(staff_id) {
                    return Ok(Vec::new());
                }
            }
            Ok(vec![member.id])
        }
        None => store.list_candidate_staff(&request.tenant_id, request.service_id.as_ref()),
    }
}

fn load_checked<S>(store: &S, staff: &[StaffId], weekday: Weekday, range: &UtcInterval) -> Result<Snapshot>
where
    S: BookingStore + ?Sized,
{
    let snapshot = store.load_snapshot(staff, weekday, range)?;
    if let Err(err) = snapshot.validate() {
        error!(%err, "store returned a malformed snapshot");
        return Err(err);
    }
    Ok(snapshot)
}

/// The zone a request is evaluated in: `timezone` when given, else the
/// tenant's. The tenant must exist either way.
///
/// # Errors
///
/// [`BookingError::TenantNotFound`] or [`BookingError::InvalidTimezone`].
pub fn request_timezone<S>(store: &S, tenant_id: &TenantId, timezone: Option<&str>) -> Result<Tz>
where
    S: BookingStore + ?Sized,
{
    let tenant = store.tenant(tenant_id)?;
    parse_timezone(timezone.unwrap_or(&tenant.timezone))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScheduleRule, Service, StaffMember, Tenant};
    use crate::store::{MemoryStore, SalonData};

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
    }

    fn store() -> MemoryStore {
        let member = |id: &str, name: &str| StaffMember {
            id: id.into(),
            tenant_id: "salon".into(),
            name: name.to_string(),
            active: true,
        };
        let nine_to_five = |id: &str| ScheduleRule {
            staff_id: id.into(),
            weekday: Weekday::Mon,
            start: "09:00".parse().unwrap(),
            end: "17:00".parse().unwrap(),
        };
        MemoryStore::new(SalonData {
            tenants: vec![Tenant {
                id: "salon".into(),
                name: "Demo".to_string(),
                timezone: "America/Toronto".to_string(),
            }],
            staff: vec![member("x", "Alex"), member("y", "Jordan")],
            services: vec![Service {
                id: "cut".into(),
                tenant_id: "salon".into(),
                name: "Haircut".to_string(),
                duration_minutes: 30,
                staff: vec!["y".into()],
            }],
            rules: vec![nine_to_five("x"), nine_to_five("y")],
            ..Default::default()
        })
        .unwrap()
    }

    fn request(time: &str) -> AvailabilityRequest {
        AvailabilityRequest {
            tenant_id: "salon".into(),
            date: monday(),
            time_of_day: time.parse().unwrap(),
            duration_minutes: 30,
            timezone: None,
            staff_id: None,
            service_id: None,
        }
    }

    #[test]
    fn test_available_picks_first_in_name_order() {
        let result = check_availability(&store(), &request("10:00"), &EngineConfig::default()).unwrap();
        assert!(result.available);
        assert_eq!(result.staff_id, Some("x".into()));
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_service_filter_limits_candidates() {
        let mut req = request("10:00");
        req.service_id = Some("cut".into());
        let result = check_availability(&store(), &req, &EngineConfig::default()).unwrap();
        assert_eq!(result.staff_id, Some("y".into()));
    }

    #[test]
    fn test_explicit_staff_who_lacks_service_is_unavailable() {
        let mut req = request("10:00");
        req.service_id = Some("cut".into());
        req.staff_id = Some("x".into());
        let result = check_availability(&store(), &req, &EngineConfig::default()).unwrap();
        assert!(!result.available);
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_unknown_staff_is_not_found() {
        let mut req = request("10:00");
        req.staff_id = Some("ghost".into());
        let err = check_availability(&store(), &req, &EngineConfig::default()).unwrap_err();
        assert_eq!(err, BookingError::StaffNotFound("ghost".into()));
    }

    #[test]
    fn test_unknown_tenant_and_timezone() {
        let mut req = request("10:00");
        req.timezone = Some("Mars/Olympus".to_string());
        let err = check_availability(&store(), &req, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTimezone(_)));

        req.tenant_id = "nobody".into();
        let err = check_availability(&store(), &req, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BookingError::TenantNotFound(_)));
    }

    #[test]
    fn test_timezone_override_shifts_the_request() {
        // Weekly rules are wall-clock times in the request's zone too
        let mut req = request("15:00");
        req.timezone = Some("America/Vancouver".to_string());
        let evaluation = evaluate(&store(), &req, &EngineConfig::default()).unwrap();
        assert!(evaluation.result.available);
        assert_eq!(evaluation.interval.start.to_rfc3339(), "2026-01-12T23:00:00+00:00");
    }

    #[test]
    fn test_auto_assign_respects_service_staff() {
        let store = store();
        let tz = parse_timezone("America/Toronto").unwrap();
        let interval = resolve_interval(monday(), "11:00".parse().unwrap(), 30, tz).unwrap();
        let result = auto_assign(
            &store,
            &AutoAssignRequest {
                tenant_id: "salon".into(),
                service_id: "cut".into(),
                utc_start: interval.start,
                utc_end: interval.end,
                local_weekday: Weekday::Mon,
                local_time_of_day: "11:00".parse().unwrap(),
                duration_minutes: 30,
            },
        )
        .unwrap();
        assert_eq!(result.staff_id, Some("y".into()));
    }

    #[test]
    fn test_auto_assign_unknown_service() {
        let store = store();
        let tz = parse_timezone("America/Toronto").unwrap();
        let interval = resolve_interval(monday(), "11:00".parse().unwrap(), 30, tz).unwrap();
        let err = auto_assign(
            &store,
            &AutoAssignRequest {
                tenant_id: "salon".into(),
                service_id: "perm".into(),
                utc_start: interval.start,
                utc_end: interval.end,
                local_weekday: Weekday::Mon,
                local_time_of_day: "11:00".parse().unwrap(),
                duration_minutes: 30,
            },
        )
        .unwrap_err();
        assert_eq!(err, BookingError::ServiceNotFound("perm".into()));
    }

    #[test]
    fn test_auto_assign_rejects_mismatched_duration() {
        let store = store();
        let tz = parse_timezone("America/Toronto").unwrap();
        let interval = resolve_interval(monday(), "11:00".parse().unwrap(), 30, tz).unwrap();
        let err = auto_assign(
            &store,
            &AutoAssignRequest {
                tenant_id: "salon".into(),
                service_id: "cut".into(),
                utc_start: interval.start,
                utc_end: interval.end,
                local_weekday: Weekday::Mon,
                local_time_of_day: "11:00".parse().unwrap(),
                duration_minutes: 45,
            },
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::InvalidDuration(_)));
    }

    #[test]
    fn test_request_timezone_falls_back_to_tenant() {
        let store = store();
        let tz = request_timezone(&store, &"salon".into(), None).unwrap();
        assert_eq!(tz.name(), "America/Toronto");
        let tz = request_timezone(&store, &"salon".into(), Some("Asia/Tokyo")).unwrap();
        assert_eq!(tz.name(), "Asia/Tokyo");
    }

    #[test]
    fn test_timezone_override_still_requires_tenant() {
        let mut req = request("10:00");
        req.tenant_id = "nobody".into();
        req.timezone = Some("Asia/Tokyo".to_string());
        let err = check_availability(&store(), &req, &EngineConfig::default()).unwrap_err();
        assert_eq!(err, BookingError::TenantNotFound("nobody".into()));
    }

    #[test]
    fn test_huge_duration_is_unavailable_without_alternatives() {
        let mut req = request("10:00");
        req.duration_minutes = u32::MAX - 100;
        let result = check_availability(&store(), &req, &EngineConfig::default()).unwrap();
        assert!(!result.available);
        assert_eq!(result.staff_id, None);
        assert!(result.alternatives.is_empty());
    }
}
