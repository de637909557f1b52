//! Elapsed-versus-required minutes for in-progress appointments.
//!
//! Completion is never blocked on duration; the result only tells the
//! caller whether to ask for an early-completion justification, or how
//! long is left while the appointment is still running.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::GateConfig;
use crate::model::{Appointment, AppointmentStatus};
use crate::time::minutes_since;

/// Elapsed and required service time, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationProgress {
    /// `floor((now - started_at) / 60s)`.
    pub elapsed_minutes: i64,
    /// `units_required × unit_minutes`.
    pub required_minutes: i64,
    /// Minutes still owed, never below zero.
    pub remaining_minutes: i64,
    pub has_met_minimum_duration: bool,
}

/// Minutes of service owed for `units` billing units.
///
/// Saturates instead of overflowing when `config` was never validated.
pub fn required_minutes(units: u32, config: &GateConfig) -> i64 {
    i64::from(units).saturating_mul(config.unit_minutes)
}

/// Compare time elapsed since `started_at` against the units booked.
///
/// # Examples
///
/// ```
/// use appointment_gate::{evaluate_duration, GateConfig};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
/// let progress = evaluate_duration(now - Duration::minutes(29), 2, now, &GateConfig::default());
/// assert_eq!(progress.required_minutes, 30);
/// assert!(!progress.has_met_minimum_duration);
/// ```
pub fn evaluate_duration(
    started_at: DateTime<Utc>,
    units_required: u32,
    now: DateTime<Utc>,
    config: &GateConfig,
) -> DurationProgress {
    let elapsed_minutes = minutes_since(now, started_at);
    let required_minutes = required_minutes(units_required, config);

    DurationProgress {
        elapsed_minutes,
        required_minutes,
        remaining_minutes: required_minutes.saturating_sub(elapsed_minutes).max(0),
        has_met_minimum_duration: elapsed_minutes >= required_minutes,
    }
}

/// Minutes left before an in-progress appointment reaches its minimum duration.
///
/// Returns `None` unless the appointment is `in_progress` with a recorded
/// `started_at`.
pub fn time_remaining(
    appointment: &Appointment,
    now: DateTime<Utc>,
    config: &GateConfig,
) -> Option<i64> {
    if appointment.status != AppointmentStatus::InProgress {
        return None;
    }
    let started_at = appointment.started_at?;
    Some(evaluate_duration(started_at, appointment.units_required, now, config).remaining_minutes)
}
