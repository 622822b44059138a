//! Salon entities as read from the store.
//!
//! Weekdays are `chrono::Weekday` everywhere inside the engine. Numeric
//! weekdays only appear at the data edge, where 0 is Sunday and 6 is
//! Saturday (see [`weekday_from_index`]).

use std::fmt;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::time::{TimeOfDay, UtcInterval};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }
    };
}

id_type!(
    /// A salon account.
    TenantId
);
id_type!(
    /// A barber or other service provider.
    StaffId
);
id_type!(ServiceId);
id_type!(AppointmentId);

/// Map a 0–6 Sunday-first weekday number onto `chrono::Weekday`.
///
/// Monday–Saturday rules numbered 1–6 land on the same days under this
/// convention.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// IANA zone name used for every wall-clock interpretation of this tenant.
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub tenant_id: TenantId,
    pub name: String,
    pub duration_minutes: u32,
    /// Staff able to perform the service; empty means everyone.
    #[serde(default)]
    pub staff: Vec<StaffId>,
}

impl Service {
    pub fn is_performed_by(&self, staff_id: &StaffId) -> bool {
        self.staff.is_empty() || self.staff.contains(staff_id)
    }
}

/// One recurring weekly availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub staff_id: StaffId,
    /// `"Mon"`/`"Monday"` or a 0–6 Sunday-first index on input.
    #[serde(deserialize_with = "deserialize_weekday")]
    pub weekday: Weekday,
    pub start: TimeOfDay,
    /// `"24:00"` for a window that runs to midnight.
    pub end: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOff {
    pub staff_id: StaffId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TimeOff {
    pub fn interval(&self) -> UtcInterval {
        UtcInterval::new(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Tentative,
    Confirmed,
    Cancelled,
    NoShow,
    Completed,
}

impl AppointmentStatus {
    /// Only tentative and confirmed appointments block the staff member's time.
    pub fn occupies_timeline(self) -> bool {
        matches!(self, AppointmentStatus::Tentative | AppointmentStatus::Confirmed)
    }
}

/// Where a booking came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingSource {
    #[default]
    Manual,
    Api,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub tenant_id: TenantId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub source: BookingSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Appointment {
    pub fn interval(&self) -> UtcInterval {
        UtcInterval::new(self.start, self.end)
    }
}

/// An appointment about to be committed; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub tenant_id: TenantId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub interval: UtcInterval,
    pub status: AppointmentStatus,
    pub source: BookingSource,
    pub notes: Option<String>,
}

/// Everything the engine reads for one decision.
///
/// Built once per request; the engine never goes back to the store while
/// deciding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub rules: Vec<ScheduleRule>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub time_off: Vec<TimeOff>,
}

impl Snapshot {
    /// Check that every rule, appointment and time-off entry has `start < end`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::MalformedSnapshot`] naming the first bad row.
    pub fn validate(&self) -> Result<()> {
        if let Some(rule) = self.rules.iter().find(|r| r.start >= r.end) {
            return Err(BookingError::MalformedSnapshot(format!(
                "schedule rule for {} on {} has start {} not before end {}",
                rule.staff_id, rule.weekday, rule.start, rule.end
            )));
        }
        if let Some(appt) = self.appointments.iter().find(|a| !a.interval().is_well_formed()) {
            return Err(BookingError::MalformedSnapshot(format!(
                "appointment {} has an empty or inverted interval",
                appt.id
            )));
        }
        if let Some(off) = self.time_off.iter().find(|t| !t.interval().is_well_formed()) {
            return Err(BookingError::MalformedSnapshot(format!(
                "time off for {} has an empty or inverted interval",
                off.staff_id
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn deserialize_weekday<'de, D>(deserializer: D) -> std::result::Result<Weekday, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Index(u8),
        Name(Weekday),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Index(index) => weekday_from_index(index).ok_or_else(|| {
            serde::de::Error::custom(format!("weekday index {index} is not in 0..=6"))
        }),
        Repr::Name(day) => Ok(day),
    }
}
