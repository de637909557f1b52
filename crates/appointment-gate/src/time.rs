//! Time-window arithmetic shared by every gate.
//!
//! All functions are total over valid instants and take the reference clock
//! as an argument. Nothing here reads the system clock, and nothing here
//! knows about appointment statuses; the business thresholds live in
//! [`crate::gate`] and [`crate::scheduling`].
//!
//! # Functions
//!
//! - [`minutes_between`] — signed, floored minute difference between two instants
//! - [`minutes_until`] / [`minutes_since`] — the same, phrased relative to "now"
//! - [`is_same_local_day`] — calendar-day equality in a given timezone
//! - [`parse_timestamp`] — ISO-8601 boundary parsing into `DateTime<Utc>`

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::GateError;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Naive wall-clock layouts accepted when the input carries no UTC offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ── minute deltas ───────────────────────────────────────────────────────────

/// Signed minute difference `floor((t1 - t2) / 60s)`.
///
/// The floor is taken toward negative infinity, so 30 seconds *before*
/// `t2` is `-1`, not `0`.
///
/// # Examples
///
/// ```
/// use appointment_gate::time::minutes_between;
/// use chrono::{TimeZone, Utc};
///
/// let a = Utc.with_ymd_and_hms(2026, 3, 2, 9, 45, 59).unwrap();
/// let b = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
/// assert_eq!(minutes_between(a, b), 45);
/// assert_eq!(minutes_between(b, a), -46);
/// ```
pub fn minutes_between(t1: DateTime<Utc>, t2: DateTime<Utc>) -> i64 {
    (t1 - t2).num_milliseconds().div_euclid(MILLIS_PER_MINUTE)
}

/// Minutes from `now` until `target` (negative once `target` has passed).
pub fn minutes_until(now: DateTime<Utc>, target: DateTime<Utc>) -> i64 {
    minutes_between(target, now)
}

/// Minutes elapsed from `since` to `now` (negative if `since` is in the future).
pub fn minutes_since(now: DateTime<Utc>, since: DateTime<Utc>) -> i64 {
    minutes_between(now, since)
}

// ── calendar days ───────────────────────────────────────────────────────────

/// Whether two instants fall on the same calendar day in `tz`.
///
/// This is the local day, not the UTC day: 23:59 and 00:01 in New York can
/// share a UTC date while being on different local dates.
pub fn is_same_local_day(a: DateTime<Utc>, b: DateTime<Utc>, tz: &Tz) -> bool {
    a.with_timezone(tz).date_naive() == b.with_timezone(tz).date_naive()
}

/// Format an instant as local `HH:MM`, for human-readable reasons.
pub fn format_local_time(dt: DateTime<Utc>, tz: &Tz) -> String {
    dt.with_timezone(tz).format("%H:%M").to_string()
}

// ── boundary parsing ────────────────────────────────────────────────────────

/// Parse an ISO-8601 timestamp into an absolute instant.
///
/// Strings with an offset (`2026-03-02T09:00:00Z`, `...+02:00`) are parsed as
/// RFC 3339. Strings without one are wall-clock times in `tz`.
///
/// # Errors
///
/// Returns [`GateError::InvalidDatetime`] if the string matches no accepted
/// layout, or names a local time skipped by a DST transition. Local times
/// repeated by a DST transition resolve to the earlier instant.
pub fn parse_timestamp(s: &str, tz: &Tz) -> Result<DateTime<Utc>, GateError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| GateError::InvalidDatetime(format!("'{s}': not an ISO-8601 timestamp")))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            GateError::InvalidDatetime(format!("'{s}': local time does not exist in {tz}"))
        })
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz, GateError> {
    s.parse::<Tz>()
        .map_err(|_| GateError::InvalidTimezone(format!("'{s}'")))
}
