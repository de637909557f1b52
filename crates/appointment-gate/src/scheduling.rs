//! Approve or reject a prospective booking.
//!
//! Combines the two-axis conflict scan with the client's remaining unit
//! balance. Errors block the booking; warnings are informational only.

use serde::Serialize;
use tracing::debug;

use crate::config::GateConfig;
use crate::conflict::{detect_conflicts, BookingRequest, ConflictAxis, ConflictingAppointment};
use crate::model::ConflictCandidate;
use crate::time::format_local_time;

/// Result of [`validate_scheduling`]. `is_valid` is `errors.is_empty()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulingValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// The client's unit balance for the booking being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitBalance {
    pub available: u32,
    pub required: u32,
}

impl UnitBalance {
    /// A balance check only applies when both sides are known.
    pub fn from_parts(available: Option<u32>, required: Option<u32>) -> Option<Self> {
        Some(Self {
            available: available?,
            required: required?,
        })
    }
}

/// Validate a proposed booking against existing bookings and the unit balance.
///
/// Blocking errors:
/// - the interval is empty or inverted
/// - any client-axis or team-axis conflict (one error per conflicting record)
/// - `required > available`
///
/// A warning is added when `required > available × low_balance_ratio` but
/// still within the balance.
pub fn validate_scheduling(
    request: &BookingRequest,
    siblings: &[ConflictCandidate],
    units: Option<UnitBalance>,
    config: &GateConfig,
) -> SchedulingValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if request.end_time <= request.start_time {
        errors.push("Appointment end time must be after its start time".to_string());
    } else {
        let report = detect_conflicts(request, siblings);
        errors.extend(report.conflicts.iter().map(|c| describe_conflict(c, config)));
    }

    if let Some(UnitBalance {
        available,
        required,
    }) = units
    {
        if required > available {
            errors.push(format!(
                "Not enough units: {required} required but only {available} available"
            ));
        } else if f64::from(required) > f64::from(available) * config.low_balance_ratio {
            warnings.push(format!(
                "Low unit balance: this booking uses {required} of the {available} remaining units"
            ));
        }
    }

    debug!(
        "scheduling validation for client {}: {} errors, {} warnings",
        request.client_id,
        errors.len(),
        warnings.len()
    );

    SchedulingValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn describe_conflict(conflict: &ConflictingAppointment, config: &GateConfig) -> String {
    let who = match conflict.axis {
        ConflictAxis::Client => "Client",
        ConflictAxis::Team => "Team member",
    };
    let appt = &conflict.appointment;
    // detect_conflicts only reports siblings with both bounds
    match (appt.start_time, appt.end_time) {
        (Some(start), Some(end)) => format!(
            "{who} already has an appointment from {} to {}",
            format_local_time(start, &config.timezone),
            format_local_time(end, &config.timezone)
        ),
        _ => format!("{who} already has an overlapping appointment ({})", appt.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppointmentStatus;
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Tz;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn existing() -> Vec<ConflictCandidate> {
        vec![ConflictCandidate {
            id: "x".into(),
            client_id: "c1".into(),
            team_id: Some("t1".into()),
            start_time: Some(t(9, 0)),
            end_time: Some(t(10, 0)),
            status: AppointmentStatus::Scheduled,
        }]
    }

    fn request(
        client: &str,
        team: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BookingRequest {
        BookingRequest {
            start_time: start,
            end_time: end,
            client_id: client.into(),
            team_id: team.map(Into::into),
            exclude_id: None,
        }
    }

    #[test]
    fn test_clean_booking_is_valid() {
        let v = validate_scheduling(
            &request("c1", Some("t1"), t(10, 0), t(11, 0)),
            &existing(),
            None,
            &GateConfig::default(),
        );
        assert!(v.is_valid);
        assert!(v.errors.is_empty());
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn test_conflicts_become_errors() {
        let v = validate_scheduling(
            &request("c1", Some("t1"), t(9, 30), t(10, 30)),
            &existing(),
            None,
            &GateConfig::default(),
        );
        assert!(!v.is_valid);
        assert_eq!(
            v.errors,
            vec![
                "Client already has an appointment from 09:00 to 10:00".to_string(),
                "Team member already has an appointment from 09:00 to 10:00".to_string(),
            ]
        );
    }

    #[test]
    fn test_error_times_use_local_zone() {
        let berlin: Tz = "Europe/Berlin".parse().unwrap();
        let v = validate_scheduling(
            &request("c1", None, t(9, 30), t(10, 30)),
            &existing(),
            None,
            &GateConfig::with_timezone(berlin),
        );
        assert_eq!(v.errors, vec!["Client already has an appointment from 10:00 to 11:00"]);
    }

    #[test]
    fn test_inverted_interval() {
        let v = validate_scheduling(
            &request("c1", None, t(11, 0), t(11, 0)),
            &existing(),
            None,
            &GateConfig::default(),
        );
        assert!(!v.is_valid);
        assert_eq!(v.errors.len(), 1);
        assert!(v.errors[0].contains("after its start"));
    }

    #[test]
    fn test_insufficient_units() {
        let v = validate_scheduling(
            &request("c1", None, t(12, 0), t(13, 0)),
            &existing(),
            UnitBalance::from_parts(Some(3), Some(4)),
            &GateConfig::default(),
        );
        assert!(!v.is_valid);
        assert!(v.errors[0].contains("4 required but only 3 available"));
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn test_low_balance_warning_does_not_invalidate() {
        let v = validate_scheduling(
            &request("c1", None, t(12, 0), t(13, 0)),
            &existing(),
            UnitBalance::from_parts(Some(10), Some(9)),
            &GateConfig::default(),
        );
        assert!(v.is_valid);
        assert_eq!(v.warnings.len(), 1);
        assert!(v.warnings[0].contains("9 of the 10"));
    }

    #[test]
    fn test_low_balance_threshold_is_strict() {
        // 8 is exactly 80% of 10: no warning
        let v = validate_scheduling(
            &request("c1", None, t(12, 0), t(13, 0)),
            &[],
            UnitBalance::from_parts(Some(10), Some(8)),
            &GateConfig::default(),
        );
        assert!(v.is_valid);
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn test_units_ignored_when_partial() {
        assert_eq!(UnitBalance::from_parts(None, Some(4)), None);
        assert_eq!(UnitBalance::from_parts(Some(4), None), None);

        let v = validate_scheduling(
            &request("c1", None, t(12, 0), t(13, 0)),
            &[],
            UnitBalance::from_parts(None, Some(400)),
            &GateConfig::default(),
        );
        assert!(v.is_valid);
    }
}
