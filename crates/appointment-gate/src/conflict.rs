//! Detect bookings that overlap a proposed appointment.
//!
//! A proposed interval is checked on two independent axes: the client's
//! existing bookings and the team member's existing bookings. Intervals are
//! half-open, so back-to-back appointments (one ends exactly when the next
//! starts) are NOT conflicts.
//!
//! The detector only sees the sibling snapshot the caller passes in. Two
//! concurrent requests validated against the same stale snapshot can both
//! pass; the storage layer must re-check at commit time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::model::ConflictCandidate;

/// The resource a conflicting booking collides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictAxis {
    Client,
    Team,
}

/// A proposed booking to check against existing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub client_id: String,
    /// `None` when nobody is assigned yet; the team axis is then skipped.
    #[serde(default)]
    pub team_id: Option<String>,
    /// Id of the record being edited in place, ignored during the scan.
    #[serde(default)]
    pub exclude_id: Option<String>,
}

/// An existing booking that overlaps the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictingAppointment {
    pub appointment: ConflictCandidate,
    pub axis: ConflictAxis,
    /// Length of the shared time range.
    pub overlap_minutes: i64,
}

/// Every conflict found for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub has_conflict: bool,
    pub conflicts: Vec<ConflictingAppointment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConflictReport {
    /// Conflicts on one axis, in sibling order.
    pub fn on_axis(&self, axis: ConflictAxis) -> impl Iterator<Item = &ConflictingAppointment> {
        self.conflicts.iter().filter(move |c| c.axis == axis)
    }
}

/// Whether `[start1, end1)` and `[start2, end2)` overlap.
///
/// Symmetric in its two intervals. Adjacent intervals do not overlap.
///
/// # Examples
///
/// ```
/// use appointment_gate::conflict::has_time_conflict;
/// use chrono::{TimeZone, Utc};
///
/// let t = |h| Utc.with_ymd_and_hms(2026, 3, 2, h, 0, 0).unwrap();
/// assert!(has_time_conflict(t(9), t(11), t(10), t(12)));
/// assert!(!has_time_conflict(t(9), t(10), t(10), t(11)));
/// ```
pub fn has_time_conflict(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && end1 > start2
}

/// Find every sibling overlapping `request` on the client or team axis.
///
/// Siblings are skipped when they are the excluded record, are cancelled or
/// deleted, or lack a start or end time. A sibling sharing both the client
/// and the team member is reported once per axis.
pub fn detect_conflicts(
    request: &BookingRequest,
    siblings: &[ConflictCandidate],
) -> ConflictReport {
    let team_id = request.team_id.as_deref().filter(|t| !t.is_empty());
    let mut conflicts = Vec::new();

    let live: Vec<(&ConflictCandidate, DateTime<Utc>, DateTime<Utc>)> = siblings
        .iter()
        .filter(|c| request.exclude_id.as_deref() != Some(c.id.as_str()))
        .filter(|c| !c.status.is_withdrawn())
        .filter_map(|c| Some((c, c.start_time?, c.end_time?)))
        .collect();

    for &(candidate, start, end) in &live {
        if candidate.client_id != request.client_id {
            continue;
        }
        trace!("client-axis check against {}", candidate.id);
        if let Some(conflict) = overlap(request, candidate, start, end, ConflictAxis::Client) {
            conflicts.push(conflict);
        }
    }

    if let Some(team_id) = team_id {
        for &(candidate, start, end) in &live {
            if candidate.team_id.as_deref() != Some(team_id) {
                continue;
            }
            trace!("team-axis check against {}", candidate.id);
            if let Some(conflict) = overlap(request, candidate, start, end, ConflictAxis::Team) {
                conflicts.push(conflict);
            }
        }
    }

    let message = summarize(&conflicts);
    debug!(
        "conflict scan for client {} over {} siblings: {} conflicts",
        request.client_id,
        siblings.len(),
        conflicts.len()
    );

    ConflictReport {
        has_conflict: !conflicts.is_empty(),
        conflicts,
        message,
    }
}

fn overlap(
    request: &BookingRequest,
    candidate: &ConflictCandidate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    axis: ConflictAxis,
) -> Option<ConflictingAppointment> {
    if !has_time_conflict(request.start_time, request.end_time, start, end) {
        return None;
    }
    let overlap_start = request.start_time.max(start);
    let overlap_end = request.end_time.min(end);

    Some(ConflictingAppointment {
        appointment: candidate.clone(),
        axis,
        overlap_minutes: (overlap_end - overlap_start).num_minutes(),
    })
}

fn summarize(conflicts: &[ConflictingAppointment]) -> Option<String> {
    let count = |axis: ConflictAxis| conflicts.iter().filter(|c| c.axis == axis).count();
    let plural = |n: usize| if n == 1 { "" } else { "s" };

    let mut parts = Vec::new();
    let client = count(ConflictAxis::Client);
    if client > 0 {
        parts.push(format!(
            "client has {client} overlapping appointment{}",
            plural(client)
        ));
    }
    let team = count(ConflictAxis::Team);
    if team > 0 {
        parts.push(format!(
            "team member has {team} overlapping appointment{}",
            plural(team)
        ));
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("Scheduling conflict: {}", parts.join("; ")))
    }
}
