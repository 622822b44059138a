//! Timezone-correct resolution between salon wall-clock time and UTC.
//!
//! Every booking request arrives as a local calendar date plus a wall-clock
//! time in the salon's timezone, while appointments and time-off are stored
//! as UTC instants. This module is the only place where the two meet.
//!
//! All conversions go through the zone's real offset rules from `chrono-tz`,
//! so a 10:00 booking in `America/Toronto` lands on 15:00Z in January and
//! 14:00Z in July. A fixed offset is never assumed.
//!
//! # Functions
//!
//! - [`parse_timezone`] — IANA zone name to [`Tz`]
//! - [`resolve_interval`] — local date + time + duration to a [`UtcInterval`]
//! - [`to_local`] — UTC instant back to local date, time and weekday
//! - [`local_day_bounds`] — the UTC span covered by one local calendar day

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

const MINUTES_PER_DAY: u32 = 24 * 60;

// ── TimeOfDay ───────────────────────────────────────────────────────────────

/// A wall-clock time with minute resolution, in 24-hour form.
///
/// Parses both `"14:30"` and `"2:30 PM"`; serializes as `"14:30"`. `"24:00"`
/// ([`TimeOfDay::END_OF_DAY`]) closes a day, so a schedule rule can run up to
/// midnight; as a start time it means midnight of the following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };

    /// `24:00`, minute-of-day 1440.
    pub const END_OF_DAY: TimeOfDay = TimeOfDay { hour: 24, minute: 0 };

    /// Compile-time constructor for known-good constants.
    pub(crate) const fn hm(hour: u8, minute: u8) -> Self {
        assert!(hour < 24 && minute < 60);
        TimeOfDay { hour, minute }
    }

    /// Build a time from 24-hour components.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidTimeFormat`] if `hour > 23` or
    /// `minute > 59`, except for `24:00`.
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if !is_clock(hour, minute) {
            return Err(BookingError::InvalidTimeFormat(format!(
                "{hour:02}:{minute:02} is out of range"
            )));
        }
        Ok(TimeOfDay {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Build a time from minutes since local midnight; `None` past 23:59.
    pub fn from_minute_of_day(minutes: u32) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then(|| TimeOfDay {
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
        })
    }

    pub fn hour(&self) -> u32 {
        self.hour as u32
    }

    pub fn minute(&self) -> u32 {
        self.minute as u32
    }

    /// Minutes since local midnight (0..=1440).
    pub fn minute_of_day(&self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    pub fn is_end_of_day(&self) -> bool {
        *self == TimeOfDay::END_OF_DAY
    }

    /// `None` for `24:00`, which has no `NaiveTime`.
    pub fn to_naive(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0)
    }

    /// The 12-hour label shown to customers, e.g. `"9:00 AM"` or `"12:30 PM"`.
    pub fn label(&self) -> String {
        let period = if (12..24).contains(&self.hour) { "PM" } else { "AM" };
        let display_hour = match self.hour {
            0 | 24 => 12,
            h if h > 12 => h - 12,
            h => h,
        };
        format!("{display_hour}:{:02} {period}", self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        let (hour, minute) = parse_clock(s)
            .ok_or_else(|| BookingError::InvalidTimeFormat(format!("'{}'", s.trim())))?;
        TimeOfDay::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

// ── UtcInterval ─────────────────────────────────────────────────────────────

/// A half-open `[start, end)` span of absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtcInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl UtcInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        UtcInterval { start, end }
    }

    /// Two intervals overlap iff `a.start < b.end && b.start < a.end`.
    ///
    /// Back-to-back intervals (one ends exactly when the other starts) do
    /// not overlap.
    pub fn overlaps(&self, other: &UtcInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// The smallest interval containing both `self` and `other`.
    pub fn cover(&self, other: &UtcInterval) -> UtcInterval {
        UtcInterval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for UtcInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

// ── LocalDateTime ───────────────────────────────────────────────────────────

/// A UTC instant expressed on the salon's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalDateTime {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub weekday: Weekday,
}

// ── Conversions ─────────────────────────────────────────────────────────────

/// Parse an IANA timezone string into `Tz`.
///
/// # Errors
///
/// Returns [`BookingError::InvalidTimezone`] for unknown zone identifiers.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| BookingError::InvalidTimezone(format!("'{name}'")))
}

/// Resolve a local booking request into the UTC interval it occupies.
///
/// `(date, time)` is read as wall-clock time in `tz`; the end is exactly
/// `duration_minutes` of elapsed time after the start, even across a DST
/// transition.
///
/// A local time that occurs twice (the repeated hour when clocks fall back)
/// resolves to the earlier instant.
///
/// # Errors
///
/// Returns [`BookingError::InvalidDuration`] if `duration_minutes` is zero, or
/// [`BookingError::NonexistentLocalTime`] if the wall-clock time falls inside a
/// spring-forward gap.
///
/// # Examples
///
/// ```
/// use booking_engine::time::{parse_timezone, resolve_interval, TimeOfDay};
/// use chrono::NaiveDate;
///
/// let tz = parse_timezone("America/Toronto").unwrap();
/// let date = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
/// let time: TimeOfDay = "10:00 AM".parse().unwrap();
///
/// let interval = resolve_interval(date, time, 30, tz).unwrap();
/// // January is EST (UTC-5)
/// assert_eq!(interval.start.to_rfc3339(), "2026-01-12T15:00:00+00:00");
/// assert_eq!(interval.duration_minutes(), 30);
/// ```
pub fn resolve_interval(
    date: NaiveDate,
    time: TimeOfDay,
    duration_minutes: u32,
    tz: Tz,
) -> Result<UtcInterval> {
    if duration_minutes == 0 {
        return Err(BookingError::InvalidDuration(
            "duration must be positive".to_string(),
        ));
    }
    let start = local_to_utc(date, time, tz)?;
    let end = start + Duration::minutes(i64::from(duration_minutes));
    Ok(UtcInterval::new(start, end))
}

/// Express a UTC instant as local date, time and weekday in `tz`.
///
/// Seconds are truncated; bookings have minute resolution.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> LocalDateTime {
    let local = instant.with_timezone(&tz);
    LocalDateTime {
        date: local.date_naive(),
        time: TimeOfDay {
            hour: local.hour() as u8,
            minute: local.minute() as u8,
        },
        weekday: local.weekday(),
    }
}

/// The UTC span of one local calendar day: `[local midnight, next local midnight)`.
///
/// On DST transition days the span is 23 or 25 hours long.
pub fn local_day_bounds(date: NaiveDate, tz: Tz) -> Result<UtcInterval> {
    let next = date
        .succ_opt()
        .ok_or_else(|| BookingError::NonexistentLocalTime(format!("day after {date}")))?;
    Ok(UtcInterval::new(
        start_of_local_day(date, tz)?,
        start_of_local_day(next, tz)?,
    ))
}

fn local_to_utc(date: NaiveDate, time: TimeOfDay, tz: Tz) -> Result<DateTime<Utc>> {
    let naive = match time.to_naive() {
        Some(clock) => date.and_time(clock),
        None => date
            .succ_opt()
            .ok_or_else(|| BookingError::NonexistentLocalTime(format!("{date} {time}")))?
            .and_time(NaiveTime::MIN),
    };
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            BookingError::NonexistentLocalTime(format!("{date} {time} in {}", tz.name()))
        })
}

/// First instant of a local day. A few zones skip midnight itself on DST days,
/// so the first existing hour is used instead.
fn start_of_local_day(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>> {
    (0..4)
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| BookingError::NonexistentLocalTime(format!("start of {date} in {}", tz.name())))
}

// ── Parsing helpers ─────────────────────────────────────────────────────────

/// Parse a clock string: "14:00", "9:30", "14:30:00", "2pm", "2:30 PM", "12:00 am".
fn parse_clock(s: &str) -> Option<(u32, u32)> {
    let compact: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let (clock, is_pm) = if let Some(rest) = compact.strip_suffix("pm") {
        (rest, Some(true))
    } else if let Some(rest) = compact.strip_suffix("am") {
        (rest, Some(false))
    } else {
        (compact.as_str(), None)
    };

    let mut parts = clock.split(':');
    let hour = parse_component(parts.next()?, 1)?;
    let minute = match parts.next() {
        Some(m) => parse_component(m, 2)?,
        // "2pm" is fine, a bare "14" is not
        None if is_pm.is_some() => 0,
        None => return None,
    };
    let second = match parts.next() {
        Some(sec) => parse_component(sec, 2)?,
        None => 0,
    };
    if parts.next().is_some() || second != 0 {
        return None;
    }

    let hour = match is_pm {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (hour, pm) {
                (12, true) => 12,
                (12, false) => 0,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None => hour,
    };

    is_clock(hour, minute).then_some((hour, minute))
}

fn is_clock(hour: u32, minute: u32) -> bool {
    (hour < 24 && minute < 60) || (hour, minute) == (24, 0)
}

/// A 1-2 digit number with at least `min_len` digits.
fn parse_component(s: &str, min_len: usize) -> Option<u32> {
    if s.len() < min_len || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ── Tests ───────────────────────────────────────────────────────────────────
