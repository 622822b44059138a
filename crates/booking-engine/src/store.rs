//! The persistence boundary.
//!
//! [`BookingStore`] is everything the engine needs from storage. Reads feed
//! one [`Snapshot`] per decision; [`BookingStore::commit_appointment`] is the
//! single write and must be transactional: when two callers race to book
//! overlapping time for the same staff member, exactly one wins and the
//! other gets [`BookingError::BookingConflict`].
//!
//! [`MemoryStore`] is a complete in-process implementation, used by the CLI
//! and the tests.

use chrono::Weekday;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assign::order_candidates;
use crate::error::{BookingError, Result};
use crate::model::{
    Appointment, AppointmentId, NewAppointment, ScheduleRule, Service, ServiceId, Snapshot,
    StaffId, StaffMember, Tenant, TenantId, TimeOff,
};
use crate::time::UtcInterval;

pub trait BookingStore: Send + Sync {
    fn tenant(&self, tenant_id: &TenantId) -> Result<Tenant>;

    fn service(&self, tenant_id: &TenantId, service_id: &ServiceId) -> Result<Service>;

    fn staff_member(&self, tenant_id: &TenantId, staff_id: &StaffId) -> Result<StaffMember>;

    /// Active staff of the tenant, able to perform `service_id` when given,
    /// in a stable order.
    fn list_candidate_staff(
        &self,
        tenant_id: &TenantId,
        service_id: Option<&ServiceId>,
    ) -> Result<Vec<StaffId>>;

    fn list_schedule_rules(&self, staff_id: &StaffId, weekday: Weekday) -> Result<Vec<ScheduleRule>>;

    /// Tentative and confirmed appointments overlapping `range`.
    fn list_active_appointments(&self, staff_id: &StaffId, range: &UtcInterval) -> Result<Vec<Appointment>>;

    fn list_time_off(&self, staff_id: &StaffId, range: &UtcInterval) -> Result<Vec<TimeOff>>;

    /// Atomically re-check for overlap and insert.
    fn commit_appointment(&self, appointment: NewAppointment) -> Result<Appointment>;

    /// Gather everything needed to decide for `staff` on one local weekday
    /// within `range`.
    fn load_snapshot(&self, staff: &[StaffId], weekday: Weekday, range: &UtcInterval) -> Result<Snapshot> {
        let mut snapshot = Snapshot::default();
        for staff_id in staff {
            snapshot.rules.extend(self.list_schedule_rules(staff_id, weekday)?);
            snapshot
                .appointments
                .extend(self.list_active_appointments(staff_id, range)?);
            snapshot.time_off.extend(self.list_time_off(staff_id, range)?);
        }
        Ok(snapshot)
    }
}

/// The full contents of one or more salons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalonData {
    pub tenants: Vec<Tenant>,
    pub staff: Vec<StaffMember>,
    pub services: Vec<Service>,
    pub rules: Vec<ScheduleRule>,
    pub appointments: Vec<Appointment>,
    pub time_off: Vec<TimeOff>,
}

impl SalonData {
    fn snapshot_for(&self, staff: &[StaffId], weekday: Weekday, range: &UtcInterval) -> Snapshot {
        Snapshot {
            rules: self
                .rules
                .iter()
                .filter(|r| staff.contains(&r.staff_id) && r.weekday == weekday)
                .cloned()
                .collect(),
            appointments: self
                .appointments
                .iter()
                .filter(|a| staff.contains(&a.staff_id) && occupies(a, range))
                .cloned()
                .collect(),
            time_off: self
                .time_off
                .iter()
                .filter(|t| staff.contains(&t.staff_id) && t.interval().overlaps(range))
                .cloned()
                .collect(),
        }
    }
}

fn occupies(appointment: &Appointment, range: &UtcInterval) -> bool {
    appointment.status.occupies_timeline() && appointment.interval().overlaps(range)
}

#[derive(Debug, Default)]
struct State {
    data: SalonData,
    next_id: u64,
}

/// [`BookingStore`] over in-memory [`SalonData`].
///
/// Commits hold the write lock across the overlap check and the insert.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// # Errors
    ///
    /// Returns [`BookingError::MalformedSnapshot`] if any rule, appointment or
    /// time-off entry does not start before it ends.
    pub fn new(data: SalonData) -> Result<Self> {
        Snapshot {
            rules: data.rules.clone(),
            appointments: data.appointments.clone(),
            time_off: data.time_off.clone(),
        }
        .validate()?;
        let next_id = data.appointments.len() as u64;
        Ok(MemoryStore {
            state: RwLock::new(State { data, next_id }),
        })
    }

    /// A copy of everything currently stored.
    pub fn data(&self) -> SalonData {
        self.state.read().data.clone()
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.state.read().data.appointments.clone()
    }
}

impl BookingStore for MemoryStore {
    fn tenant(&self, tenant_id: &TenantId) -> Result<Tenant> {
        self.state
            .read()
            .data
            .tenants
            .iter()
            .find(|t| &t.id == tenant_id)
            .cloned()
            .ok_or_else(|| BookingError::TenantNotFound(tenant_id.clone()))
    }

    fn service(&self, tenant_id: &TenantId, service_id: &ServiceId) -> Result<Service> {
        self.state
            .read()
            .data
            .services
            .iter()
            .find(|s| &s.id == service_id && &s.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| BookingError::ServiceNotFound(service_id.clone()))
    }

    fn staff_member(&self, tenant_id: &TenantId, staff_id: &StaffId) -> Result<StaffMember> {
        self.state
            .read()
            .data
            .staff
            .iter()
            .find(|s| &s.id == staff_id && &s.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| BookingError::StaffNotFound(staff_id.clone()))
    }

    fn list_candidate_staff(
        &self,
        tenant_id: &TenantId,
        service_id: Option<&ServiceId>,
    ) -> Result<Vec<StaffId>> {
        let service = service_id
            .map(|id| self.service(tenant_id, id))
            .transpose()?;
        let state = self.state.read();
        let members = state.data.staff.iter().filter(|s| {
            &s.tenant_id == tenant_id
                && service.as_ref().is_none_or(|svc| svc.is_performed_by(&s.id))
        });
        Ok(order_candidates(members))
    }

    fn list_schedule_rules(&self, staff_id: &StaffId, weekday: Weekday) -> Result<Vec<ScheduleRule>> {
        Ok(self
            .state
            .read()
            .data
            .rules
            .iter()
            .filter(|r| &r.staff_id == staff_id && r.weekday == weekday)
            .cloned()
            .collect())
    }

    fn list_active_appointments(&self, staff_id: &StaffId, range: &UtcInterval) -> Result<Vec<Appointment>> {
        Ok(self
            .state
            .read()
            .data
            .appointments
            .iter()
            .filter(|a| &a.staff_id == staff_id && occupies(a, range))
            .cloned()
            .collect())
    }

    fn list_time_off(&self, staff_id: &StaffId, range: &UtcInterval) -> Result<Vec<TimeOff>> {
        Ok(self
            .state
            .read()
            .data
            .time_off
            .iter()
            .filter(|t| &t.staff_id == staff_id && t.interval().overlaps(range))
            .cloned()
            .collect())
    }

    fn commit_appointment(&self, new: NewAppointment) -> Result<Appointment> {
        if !new.interval.is_well_formed() {
            return Err(BookingError::InvalidDuration(format!(
                "appointment interval {} is empty or inverted",
                new.interval
            )));
        }

        let mut state = self.state.write();
        if !state
            .data
            .staff
            .iter()
            .any(|s| s.id == new.staff_id && s.tenant_id == new.tenant_id)
        {
            return Err(BookingError::StaffNotFound(new.staff_id));
        }
        if new.status.occupies_timeline()
            && state
                .data
                .appointments
                .iter()
                .any(|a| a.staff_id == new.staff_id && occupies(a, &new.interval))
        {
            return Err(BookingError::BookingConflict {
                staff_id: new.staff_id,
            });
        }

        let id = loop {
            state.next_id += 1;
            let id = AppointmentId(format!("appt-{}", state.next_id));
            if !state.data.appointments.iter().any(|a| a.id == id) {
                break id;
            }
        };
        let appointment = Appointment {
            id,
            tenant_id: new.tenant_id,
            staff_id: new.staff_id,
            service_id: new.service_id,
            start: new.interval.start,
            end: new.interval.end,
            status: new.status,
            source: new.source,
            notes: new.notes,
        };
        state.data.appointments.push(appointment.clone());
        debug!(appointment = %appointment.id, staff_id = %appointment.staff_id, "committed");
        Ok(appointment)
    }

    /// Reads everything under one lock so the snapshot is consistent.
    fn load_snapshot(&self, staff: &[StaffId], weekday: Weekday, range: &UtcInterval) -> Result<Snapshot> {
        Ok(self.state.read().data.snapshot_for(staff, weekday, range))
    }
}
