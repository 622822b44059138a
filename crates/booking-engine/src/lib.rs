//! # booking-engine
//!
//! Deterministic appointment availability for multi-tenant salons.
//!
//! Given a requested local date and time, the engine decides whether a staff
//! member can take the booking, picks one when several could, and suggests
//! nearby free start times when nobody can. All decisions are pure functions
//! over a snapshot read from a [`BookingStore`]; the store's transactional
//! commit is what finally prevents double booking.
//!
//! ## Modules
//!
//! - [`time`] — Wall-clock ↔ UTC resolution with real timezone rules
//! - [`schedule`] — Weekly schedule rules → minute-of-day windows
//! - [`conflict`] — Schedule, appointment and time-off gates for one staff member
//! - [`assign`] — Deterministic candidate order and first-fit assignment
//! - [`alternatives`] — Bounded daily grid search for free start times
//! - [`engine`] — Availability checks and auto-assignment over a store
//! - [`booking`] — Availability check + commit, retrying lost races
//! - [`store`] — The persistence contract and an in-memory implementation
//! - [`model`] — Tenants, staff, services, rules, time off, appointments
//! - [`config`] — Engine tunables
//! - [`error`] — Error types

pub mod alternatives;
pub mod assign;
pub mod booking;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod model;
pub mod schedule;
pub mod store;
pub mod time;

pub use alternatives::{find_alternatives, SlotGrid};
pub use assign::{assign, order_candidates};
pub use booking::{book, BookingOutcome, BookingRequest};
pub use config::EngineConfig;
pub use conflict::{ConflictDetector, Slot, Verdict};
pub use engine::{
    auto_assign, check_availability, AutoAssignRequest, AutoAssignResult, AvailabilityRequest,
    AvailabilityResult,
};
pub use error::BookingError;
pub use model::{
    Appointment, AppointmentId, AppointmentStatus, BookingSource, NewAppointment, ScheduleRule,
    Service, ServiceId, Snapshot, StaffId, StaffMember, Tenant, TenantId, TimeOff,
};
pub use schedule::{windows_for, MinuteWindow};
pub use store::{BookingStore, MemoryStore, SalonData};
pub use time::{parse_timezone, resolve_interval, to_local, TimeOfDay, UtcInterval};
