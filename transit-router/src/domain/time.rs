//! Service-day time handling for GTFS schedules.
//!
//! GTFS expresses stop times as "HH:MM:SS" measured from the start of the
//! service day. Trips that run past midnight keep counting, so "25:10:00" is
//! ten past one the following morning. This module converts those strings to
//! and from whole seconds; all arithmetic in the router happens in that
//! integer domain and never wraps at 24 hours.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a GTFS time string cannot be parsed.
///
/// Bad schedule data is never patched silently: a query that meets one of
/// these is aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed time {input:?}: {reason}")]
pub struct MalformedTime {
    input: String,
    reason: &'static str,
}

impl MalformedTime {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }

    /// Returns the string that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// A time of day measured in seconds from the start of a service day.
///
/// Values of 24 hours and above are valid and common: they belong to trips
/// that started on the service day but run past midnight.
///
/// # Examples
///
/// ```
/// use transit_router::domain::ServiceTime;
///
/// let t = ServiceTime::parse("25:10:00").unwrap();
/// assert_eq!(t.as_seconds(), 25 * 3600 + 10 * 60);
/// assert_eq!(t.to_string(), "25:10:00");
///
/// assert!(ServiceTime::parse("25:10").is_err());
/// assert!(ServiceTime::parse("ab:cd:ef").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: ServiceTime = ServiceTime(0);

    /// Creates a time from seconds since the start of the service day.
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Creates a time from hour, minute and second components.
    ///
    /// Hours are not limited to 0-23.
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parses a GTFS "H:MM:SS" or "HH:MM:SS" string.
    ///
    /// Exactly three colon-separated numeric fields are required. Minutes and
    /// seconds must be below 60; hours may exceed 23.
    pub fn parse(s: &str) -> Result<Self, MalformedTime> {
        let trimmed = s.trim();
        let mut fields = trimmed.split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(MalformedTime::new(s, "expected HH:MM:SS"));
        };

        let hours = parse_field(h).ok_or_else(|| MalformedTime::new(s, "invalid hour digits"))?;
        let minutes =
            parse_field(m).ok_or_else(|| MalformedTime::new(s, "invalid minute digits"))?;
        let seconds =
            parse_field(sec).ok_or_else(|| MalformedTime::new(s, "invalid second digits"))?;

        if m.len() != 2 || sec.len() != 2 {
            return Err(MalformedTime::new(s, "minutes and seconds must be two digits"));
        }
        if minutes > 59 {
            return Err(MalformedTime::new(s, "minute must be 0-59"));
        }
        if seconds > 59 {
            return Err(MalformedTime::new(s, "second must be 0-59"));
        }

        hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes * 60 + seconds))
            .map(Self)
            .ok_or_else(|| MalformedTime::new(s, "hour out of range"))
    }

    /// Returns seconds since the start of the service day.
    pub const fn as_seconds(self) -> u32 {
        self.0
    }

    /// Returns the hour component (may be 24 or more).
    pub const fn hours(self) -> u32 {
        self.0 / 3600
    }

    /// Returns the minute component (0-59).
    pub const fn minutes(self) -> u32 {
        (self.0 / 60) % 60
    }

    /// Returns the second component (0-59).
    pub const fn seconds(self) -> u32 {
        self.0 % 60
    }

    /// Adds seconds, saturating at the representable maximum.
    pub fn add_seconds(self, seconds: u32) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    /// Returns `self - earlier` in seconds. Negative if `earlier` is later.
    pub fn seconds_since(self, earlier: ServiceTime) -> i64 {
        i64::from(self.0) - i64::from(earlier.0)
    }
}

impl Ord for ServiceTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ServiceTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

impl std::str::FromStr for ServiceTime {
    type Err = MalformedTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServiceTime {
    type Error = MalformedTime;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ServiceTime> for String {
    fn from(value: ServiceTime) -> Self {
        value.to_string()
    }
}

/// Converts a GTFS time string to seconds since the start of the service day.
pub fn to_seconds(time: &str) -> Result<u32, MalformedTime> {
    ServiceTime::parse(time).map(ServiceTime::as_seconds)
}

/// Formats seconds since the start of the service day as "HH:MM:SS".
pub fn from_seconds(seconds: u32) -> String {
    ServiceTime::from_seconds(seconds).to_string()
}

/// Seconds elapsed from `a` to `b` (`to_seconds(b) - to_seconds(a)`).
pub fn duration(a: &str, b: &str) -> Result<i64, MalformedTime> {
    Ok(ServiceTime::parse(b)?.seconds_since(ServiceTime::parse(a)?))
}

/// Parse an all-digit field. Empty and signed inputs are rejected.
fn parse_field(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        let t = ServiceTime::parse("00:00:00").unwrap();
        assert_eq!(t.as_seconds(), 0);

        let t = ServiceTime::parse("08:30:15").unwrap();
        assert_eq!(t.hours(), 8);
        assert_eq!(t.minutes(), 30);
        assert_eq!(t.seconds(), 15);

        // Single-digit hours are common in real feeds
        let t = ServiceTime::parse("7:05:00").unwrap();
        assert_eq!(t, ServiceTime::from_hms(7, 5, 0));
    }

    #[test]
    fn parse_past_midnight() {
        let t = ServiceTime::parse("24:00:00").unwrap();
        assert_eq!(t.as_seconds(), 86_400);

        let t = ServiceTime::parse("26:45:30").unwrap();
        assert_eq!(t.hours(), 26);
        assert_eq!(t.to_string(), "26:45:30");
    }

    #[test]
    fn parse_invalid_format() {
        // Wrong field count
        assert!(ServiceTime::parse("08:30").is_err());
        assert!(ServiceTime::parse("08:30:00:00").is_err());
        assert!(ServiceTime::parse("").is_err());

        // Non-numeric fields
        assert!(ServiceTime::parse("ab:cd:ef").is_err());
        assert!(ServiceTime::parse("08:3a:00").is_err());
        assert!(ServiceTime::parse("-1:30:00").is_err());
        assert!(ServiceTime::parse("08::00").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(ServiceTime::parse("08:60:00").is_err());
        assert!(ServiceTime::parse("08:00:60").is_err());
        assert!(ServiceTime::parse("08:5:00").is_err());
    }

    #[test]
    fn error_carries_input() {
        let err = ServiceTime::parse("8h30").unwrap_err();
        assert_eq!(err.input(), "8h30");
        assert_eq!(err.to_string(), "malformed time \"8h30\": expected HH:MM:SS");
    }

    #[test]
    fn free_functions() {
        assert_eq!(to_seconds("01:00:00").unwrap(), 3600);
        assert_eq!(from_seconds(3661), "01:01:01");
        assert_eq!(duration("23:50:00", "24:10:00").unwrap(), 20 * 60);
        assert_eq!(duration("10:00:00", "09:00:00").unwrap(), -3600);
        assert!(duration("10:00", "09:00:00").is_err());
    }

    #[test]
    fn ordering_and_arithmetic() {
        let a = ServiceTime::parse("23:59:00").unwrap();
        let b = ServiceTime::parse("24:01:00").unwrap();
        assert!(a < b);
        assert_eq!(a.add_seconds(120), b);
        assert_eq!(b.seconds_since(a), 120);
    }

    #[test]
    fn serde_uses_gtfs_strings() {
        let t: ServiceTime = serde_json::from_str("\"25:00:00\"").unwrap();
        assert_eq!(t.as_seconds(), 90_000);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"25:00:00\"");
        assert!(serde_json::from_str::<ServiceTime>("\"nope\"").is_err());
    }
}
