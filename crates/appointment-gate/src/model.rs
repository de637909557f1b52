//! Appointment records as seen by the engine.
//!
//! The engine never owns or persists these; callers hand in snapshots.
//! [`AppointmentRecord`] is the wire shape with ISO-8601 strings, and
//! [`Appointment`] is the parsed form every gate works on.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::time::parse_timestamp;

// ── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Unassigned,
    Scheduled,
    Late,
    InProgress,
    Completed,
    Cancelled,
    Deleted,
    NoShow,
    Rejected,
    TerminatedByClient,
    TerminatedByStaff,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 11] = [
        AppointmentStatus::Unassigned,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Late,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Deleted,
        AppointmentStatus::NoShow,
        AppointmentStatus::Rejected,
        AppointmentStatus::TerminatedByClient,
        AppointmentStatus::TerminatedByStaff,
    ];

    /// The stable snake_case name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Unassigned => "unassigned",
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Late => "late",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Deleted => "deleted",
            AppointmentStatus::NoShow => "no_show",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::TerminatedByClient => "terminated_by_client",
            AppointmentStatus::TerminatedByStaff => "terminated_by_staff",
        }
    }

    /// No further transition leaves this state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::Deleted
                | AppointmentStatus::Rejected
                | AppointmentStatus::TerminatedByClient
                | AppointmentStatus::TerminatedByStaff
        )
    }

    /// The service was delivered (fully or partially) and closed out.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::TerminatedByClient
                | AppointmentStatus::TerminatedByStaff
        )
    }

    /// Withdrawn records no longer hold their time slot.
    pub fn is_withdrawn(self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Deleted)
    }

    /// Statuses from which a staff member may start the appointment.
    pub fn is_startable(self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Late)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| GateError::InvalidStatus(format!("'{needle}'")))
    }
}

// ── Appointment ─────────────────────────────────────────────────────────────

/// A parsed appointment snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    /// `None` while the appointment is unassigned.
    #[serde(default)]
    pub team_id: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Absent for open-ended records.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Set once the appointment enters `in_progress`.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Number of 15-minute billing units expected.
    #[serde(default)]
    pub units_required: u32,
    #[serde(default)]
    pub title: Option<String>,
}

impl Appointment {
    /// Project this appointment onto the fields conflict detection reads.
    pub fn candidate(&self) -> ConflictCandidate {
        ConflictCandidate {
            id: self.id.clone(),
            client_id: self.client_id.clone(),
            team_id: self.team_id.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status,
        }
    }
}

/// Read-only projection of an existing booking, compared for overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCandidate {
    pub id: String,
    pub client_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
}

// ── Wire record ─────────────────────────────────────────────────────────────

/// An appointment as it arrives from the API layer, timestamps unparsed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppointmentRecord {
    pub id: String,
    pub client_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub units_required: u32,
    #[serde(default)]
    pub title: Option<String>,
}

impl AppointmentRecord {
    /// Parse the record's status and timestamps.
    ///
    /// Timestamps without a UTC offset are wall-clock times in `tz`. Blank
    /// strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidStatus`] for an unknown status name and
    /// [`GateError::InvalidDatetime`] for an unparseable timestamp.
    pub fn into_appointment(self, tz: &Tz) -> Result<Appointment, GateError> {
        let status = self.status.parse()?;
        let parse = |field: Option<String>| -> Result<Option<DateTime<Utc>>, GateError> {
            match field.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => parse_timestamp(s, tz).map(Some),
            }
        };

        Ok(Appointment {
            start_time: parse(self.start_time)?,
            end_time: parse(self.end_time)?,
            started_at: parse(self.started_at)?,
            id: self.id,
            client_id: self.client_id,
            team_id: self.team_id.filter(|t| !t.trim().is_empty()),
            status,
            units_required: self.units_required,
            title: self.title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_round_trips_through_name() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            " In_Progress ".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::InProgress
        );
    }

    #[test]
    fn test_status_parse_unknown() {
        let err = "pending".parse::<AppointmentStatus>().unwrap_err();
        assert!(err.to_string().contains("Invalid status"), "got: {err}");
    }

    #[test]
    fn test_status_serde_matches_as_str() {
        let json = serde_json::to_string(&AppointmentStatus::TerminatedByStaff).unwrap();
        assert_eq!(json, "\"terminated_by_staff\"");
    }

    #[test]
    fn test_status_classes() {
        assert!(AppointmentStatus::Rejected.is_terminal());
        assert!(!AppointmentStatus::NoShow.is_terminal());
        assert!(AppointmentStatus::TerminatedByClient.is_finished());
        assert!(!AppointmentStatus::Cancelled.is_finished());
        assert!(AppointmentStatus::Deleted.is_withdrawn());
        assert!(AppointmentStatus::Late.is_startable());
        assert!(!AppointmentStatus::Unassigned.is_startable());
    }

    #[test]
    fn test_record_into_appointment() {
        let record = AppointmentRecord {
            id: "a1".into(),
            client_id: "c1".into(),
            team_id: Some("".into()),
            status: "scheduled".into(),
            start_time: Some("2026-03-02T09:00:00".into()),
            end_time: Some("2026-03-02T10:00:00Z".into()),
            started_at: Some("  ".into()),
            units_required: 4,
            title: Some("Intake".into()),
        };
        let ny: Tz = "America/New_York".parse().unwrap();
        let appt = record.into_appointment(&ny).unwrap();

        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert_eq!(appt.team_id, None);
        assert_eq!(
            appt.start_time,
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap())
        );
        assert_eq!(
            appt.end_time,
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap())
        );
        assert_eq!(appt.started_at, None);
    }

    #[test]
    fn test_record_bad_timestamp() {
        let record = AppointmentRecord {
            id: "a1".into(),
            client_id: "c1".into(),
            status: "scheduled".into(),
            start_time: Some("tomorrow".into()),
            ..Default::default()
        };
        assert!(matches!(
            record.into_appointment(&Tz::UTC),
            Err(GateError::InvalidDatetime(_))
        ));
    }

    #[test]
    fn test_candidate_projection() {
        let appt = Appointment {
            id: "a1".into(),
            client_id: "c1".into(),
            team_id: Some("t1".into()),
            status: AppointmentStatus::Late,
            start_time: None,
            end_time: None,
            started_at: None,
            units_required: 0,
            title: None,
        };
        let c = appt.candidate();
        assert_eq!(c.id, "a1");
        assert_eq!(c.team_id.as_deref(), Some("t1"));
        assert_eq!(c.status, AppointmentStatus::Late);
    }
}
