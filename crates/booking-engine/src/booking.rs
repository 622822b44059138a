//! Turn a booking request into a committed appointment.
//!
//! The availability check is advisory, so a commit can still lose a race to
//! a concurrent booking. On [`BookingError::BookingConflict`] the whole search
//! runs again against fresh data, up to `max_commit_attempts` times.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::engine::{evaluate, AvailabilityRequest};
use crate::error::Result;
use crate::model::{
    Appointment, AppointmentStatus, BookingSource, NewAppointment, ServiceId, StaffId, TenantId,
};
use crate::store::BookingStore;
use crate::time::TimeOfDay;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    /// Book with this staff member; auto-assign when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<StaffId>,
    pub date: NaiveDate,
    pub time_of_day: TimeOfDay,
    /// Overrides the tenant's timezone when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub source: BookingSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BookingOutcome {
    Booked { appointment: Appointment },
    /// Nobody can take the requested time; here is what is free that day.
    Unavailable { alternatives: Vec<String> },
}

/// Book `request`, auto-assigning a staff member unless one is named.
///
/// The appointment lasts as long as the service and is committed as
/// confirmed.
///
/// # Errors
///
/// Lookup and time-resolution errors as for
/// [`check_availability`](crate::engine::check_availability), and
/// [`BookingError::BookingConflict`](crate::error::BookingError::BookingConflict)
/// if every attempt lost its commit race.
pub fn book<S>(store: &S, request: &BookingRequest, config: &EngineConfig) -> Result<BookingOutcome>
where
    S: BookingStore + ?Sized,
{
    let service = store.service(&request.tenant_id, &request.service_id)?;
    let availability = AvailabilityRequest {
        tenant_id: request.tenant_id.clone(),
        date: request.date,
        time_of_day: request.time_of_day,
        duration_minutes: service.duration_minutes,
        timezone: request.timezone.clone(),
        staff_id: request.staff_id.clone(),
        service_id: Some(service.id.clone()),
    };

    let attempts = config.max_commit_attempts.max(1);
    let mut attempt = 1;
    loop {
        let evaluation = evaluate(store, &availability, config)?;
        let Some(staff_id) = evaluation.result.staff_id else {
            return Ok(BookingOutcome::Unavailable {
                alternatives: evaluation.result.alternatives,
            });
        };

        let committed = store.commit_appointment(NewAppointment {
            tenant_id: request.tenant_id.clone(),
            staff_id,
            service_id: service.id.clone(),
            interval: evaluation.interval,
            status: AppointmentStatus::Confirmed,
            source: request.source,
            notes: request.notes.clone(),
        });
        match committed {
            Ok(appointment) => {
                info!(
                    appointment = %appointment.id,
                    staff_id = %appointment.staff_id,
                    interval = %evaluation.interval,
                    "booked"
                );
                return Ok(BookingOutcome::Booked { appointment });
            }
            Err(err) if err.is_retryable() && attempt < attempts => {
                warn!(%err, attempt, "lost commit race, searching again");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
