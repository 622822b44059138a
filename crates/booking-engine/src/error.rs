//! Error types for booking-engine operations.

use thiserror::Error;

use crate::model::{ServiceId, StaffId, TenantId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Nonexistent local time: {0}")]
    NonexistentLocalTime(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    #[error("Service not found: {0}")]
    ServiceNotFound(ServiceId),

    #[error("Staff member not found: {0}")]
    StaffNotFound(StaffId),

    /// A concurrent commit claimed an overlapping interval first.
    #[error("Booking conflict: {staff_id} already has an overlapping appointment")]
    BookingConflict { staff_id: StaffId },

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

impl BookingError {
    /// Whether the caller should re-run the availability search and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::BookingConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
