//! Lifecycle gates: start, self-assign, complete, cancel.
//!
//! Each gate is a pure function of an appointment snapshot, the actor's
//! situation, and a caller-supplied `now`. Rule violations are ordinary
//! decisions with a stable [`GateCode`] and a human-readable reason; no gate
//! returns `Err` or panics on an expected rejection.
//!
//! # Gates
//!
//! - [`can_start_appointment`] — `scheduled | late → in_progress`
//! - [`can_assign_to_self`] — `unassigned → scheduled` with the actor bound
//! - [`can_complete_appointment`] — `in_progress → completed`, with duration check
//! - [`can_cancel_appointment`] — any non-final status → `cancelled`
//! - [`available_actions`] — which of the above currently pass for an actor

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GateConfig;
use crate::duration::{evaluate_duration, required_minutes};
use crate::model::{Appointment, AppointmentStatus};
use crate::time::{format_local_time, is_same_local_day, minutes_since, minutes_until};

// ── Codes ───────────────────────────────────────────────────────────────────

/// Machine-readable reason a gate said no. Serialized as snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateCode {
    NoAppointment,
    InvalidStatus,
    NotAssigned,
    NoStartTime,
    NotToday,
    TooEarly,
    TooLate,
    AlreadyEnded,
    HasActiveAppointment,
    NotUnassigned,
    NotQualified,
    NotInProgress,
    NoStartTimeRecorded,
    AlreadyCancelled,
    AlreadyFinished,
    AdminRequired,
}

impl GateCode {
    pub fn as_str(self) -> &'static str {
        match self {
            GateCode::NoAppointment => "no_appointment",
            GateCode::InvalidStatus => "invalid_status",
            GateCode::NotAssigned => "not_assigned",
            GateCode::NoStartTime => "no_start_time",
            GateCode::NotToday => "not_today",
            GateCode::TooEarly => "too_early",
            GateCode::TooLate => "too_late",
            GateCode::AlreadyEnded => "already_ended",
            GateCode::HasActiveAppointment => "has_active_appointment",
            GateCode::NotUnassigned => "not_unassigned",
            GateCode::NotQualified => "not_qualified",
            GateCode::NotInProgress => "not_in_progress",
            GateCode::NoStartTimeRecorded => "no_start_time_recorded",
            GateCode::AlreadyCancelled => "already_cancelled",
            GateCode::AlreadyFinished => "already_finished",
            GateCode::AdminRequired => "admin_required",
        }
    }
}

impl fmt::Display for GateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed rule: code plus the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rejection {
    code: GateCode,
    reason: String,
}

impl Rejection {
    fn new(code: GateCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

fn require(appointment: Option<&Appointment>) -> Result<&Appointment, Rejection> {
    appointment.ok_or_else(|| Rejection::new(GateCode::NoAppointment, "No appointment provided"))
}

// ── Decisions ───────────────────────────────────────────────────────────────

/// Outcome of [`can_start_appointment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartDecision {
    pub can_start: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<GateCode>,
}

/// Outcome of [`can_assign_to_self`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignDecision {
    pub can_assign: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<GateCode>,
}

/// Outcome of [`can_complete_appointment`].
///
/// `can_complete` can be `true` while `has_met_minimum_duration` is `false`:
/// early completion is allowed but should be justified by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionDecision {
    pub can_complete: bool,
    pub has_met_minimum_duration: bool,
    pub elapsed_minutes: i64,
    pub required_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<GateCode>,
}

/// Outcome of [`can_cancel_appointment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelDecision {
    pub can_cancel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<GateCode>,
}

impl StartDecision {
    fn from_outcome(outcome: Result<(), Rejection>) -> Self {
        match outcome {
            Ok(()) => Self {
                can_start: true,
                reason: None,
                error_code: None,
            },
            Err(r) => Self {
                can_start: false,
                reason: Some(r.reason),
                error_code: Some(r.code),
            },
        }
    }
}

impl AssignDecision {
    fn from_outcome(outcome: Result<(), Rejection>) -> Self {
        match outcome {
            Ok(()) => Self {
                can_assign: true,
                reason: None,
                error_code: None,
            },
            Err(r) => Self {
                can_assign: false,
                reason: Some(r.reason),
                error_code: Some(r.code),
            },
        }
    }
}

impl CancelDecision {
    fn from_outcome(outcome: Result<(), Rejection>) -> Self {
        match outcome {
            Ok(()) => Self {
                can_cancel: true,
                reason: None,
                error_code: None,
            },
            Err(r) => Self {
                can_cancel: false,
                reason: Some(r.reason),
                error_code: Some(r.code),
            },
        }
    }
}

// ── Start ───────────────────────────────────────────────────────────────────

/// Decide whether the actor may start the appointment now.
///
/// Rules, checked in order:
///
/// 1. status is `scheduled` or `late` (`invalid_status`)
/// 2. the actor's team id equals the appointment's (`not_assigned`)
/// 3. a start time is recorded (`no_start_time`)
/// 4. the start time is on today's local calendar day (`not_today`)
/// 5. at most `start_lead_minutes` remain until the start (`too_early`)
/// 6. the end time, if any, has not passed (`already_ended`)
/// 7. the actor has no other appointment in progress (`has_active_appointment`)
pub fn can_start_appointment(
    appointment: Option<&Appointment>,
    actor_team_id: Option<&str>,
    has_active_appointment: bool,
    now: DateTime<Utc>,
    config: &GateConfig,
) -> StartDecision {
    let outcome = check_start(appointment, actor_team_id, has_active_appointment, now, config);
    log_outcome("start", appointment, &outcome);
    StartDecision::from_outcome(outcome)
}

fn check_start(
    appointment: Option<&Appointment>,
    actor_team_id: Option<&str>,
    has_active_appointment: bool,
    now: DateTime<Utc>,
    config: &GateConfig,
) -> Result<(), Rejection> {
    let appt = require(appointment)?;

    if !appt.status.is_startable() {
        return Err(Rejection::new(
            GateCode::InvalidStatus,
            format!("Cannot start an appointment that is {}", appt.status),
        ));
    }

    let Some(actor) = actor_team_id else {
        return Err(Rejection::new(
            GateCode::NotAssigned,
            "You must be signed in as a team member to start appointments",
        ));
    };
    if appt.team_id.as_deref() != Some(actor) {
        return Err(Rejection::new(
            GateCode::NotAssigned,
            "This appointment is not assigned to you",
        ));
    }

    let start = appt.start_time.ok_or_else(|| {
        Rejection::new(GateCode::NoStartTime, "Appointment has no start time")
    })?;

    if !is_same_local_day(start, now, &config.timezone) {
        return Err(Rejection::new(
            GateCode::NotToday,
            "Appointments can only be started on the day they are scheduled",
        ));
    }

    let until_start = minutes_until(now, start);
    if until_start > config.start_lead_minutes {
        let wait = until_start - config.start_lead_minutes;
        return Err(Rejection::new(
            GateCode::TooEarly,
            format!(
                "Too early to start: appointment begins in {until_start} minutes, \
                 you can start it in {wait} minute{}",
                if wait == 1 { "" } else { "s" }
            ),
        ));
    }

    if let Some(end) = appt.end_time {
        if now > end {
            return Err(Rejection::new(
                GateCode::AlreadyEnded,
                format!(
                    "Appointment already ended at {}",
                    format_local_time(end, &config.timezone)
                ),
            ));
        }
    }

    if has_active_appointment {
        return Err(Rejection::new(
            GateCode::HasActiveAppointment,
            "Finish your appointment in progress before starting another",
        ));
    }

    Ok(())
}

// ── Self-assign ─────────────────────────────────────────────────────────────

/// Decide whether a qualified staff member may take an unassigned appointment.
///
/// Early self-assignment is always allowed. Past `start_time +
/// self_assign_grace_minutes` it is rejected with `too_late`.
pub fn can_assign_to_self(
    appointment: Option<&Appointment>,
    is_qualified: bool,
    now: DateTime<Utc>,
    config: &GateConfig,
) -> AssignDecision {
    let outcome = check_assign(appointment, is_qualified, now, config);
    log_outcome("assign", appointment, &outcome);
    AssignDecision::from_outcome(outcome)
}

fn check_assign(
    appointment: Option<&Appointment>,
    is_qualified: bool,
    now: DateTime<Utc>,
    config: &GateConfig,
) -> Result<(), Rejection> {
    let appt = require(appointment)?;

    if appt.status != AppointmentStatus::Unassigned {
        return Err(Rejection::new(
            GateCode::NotUnassigned,
            format!("Appointment is already {}", appt.status),
        ));
    }

    if !is_qualified {
        return Err(Rejection::new(
            GateCode::NotQualified,
            "You are not qualified for the speciality this appointment requires",
        ));
    }

    let start = appt.start_time.ok_or_else(|| {
        Rejection::new(GateCode::NoStartTime, "Appointment has no start time")
    })?;

    let since_start = minutes_since(now, start);
    if since_start > config.self_assign_grace_minutes {
        return Err(Rejection::new(
            GateCode::TooLate,
            format!(
                "Appointment started {since_start} minutes ago; \
                 self-assignment closes {} minutes after the start",
                config.self_assign_grace_minutes
            ),
        ));
    }

    Ok(())
}

// ── Complete ────────────────────────────────────────────────────────────────

/// Decide whether an in-progress appointment may be completed, and whether
/// it has run for the booked number of units.
pub fn can_complete_appointment(
    appointment: Option<&Appointment>,
    now: DateTime<Utc>,
    config: &GateConfig,
) -> CompletionDecision {
    let rejected = |appt: Option<&Appointment>, r: Rejection| {
        let id = appt.map_or("<none>", |a| a.id.as_str());
        debug!("complete rejected for appointment {id}: {}", r.code);
        CompletionDecision {
            can_complete: false,
            has_met_minimum_duration: false,
            elapsed_minutes: 0,
            required_minutes: appt.map_or(0, |a| required_minutes(a.units_required, config)),
            reason: Some(r.reason),
            error_code: Some(r.code),
        }
    };

    let appt = match require(appointment) {
        Ok(appt) => appt,
        Err(r) => return rejected(None, r),
    };

    if appt.status != AppointmentStatus::InProgress {
        return rejected(
            Some(appt),
            Rejection::new(
                GateCode::NotInProgress,
                format!(
                    "Only in-progress appointments can be completed, this one is {}",
                    appt.status
                ),
            ),
        );
    }

    let Some(started_at) = appt.started_at else {
        return rejected(
            Some(appt),
            Rejection::new(
                GateCode::NoStartTimeRecorded,
                "Appointment has no recorded start time",
            ),
        );
    };

    let progress = evaluate_duration(started_at, appt.units_required, now, config);
    debug!(
        "complete allowed for appointment {}: {}/{} minutes",
        appt.id, progress.elapsed_minutes, progress.required_minutes
    );

    CompletionDecision {
        can_complete: true,
        has_met_minimum_duration: progress.has_met_minimum_duration,
        elapsed_minutes: progress.elapsed_minutes,
        required_minutes: progress.required_minutes,
        reason: (!progress.has_met_minimum_duration).then(|| {
            format!(
                "Minimum duration not met: {} of {} minutes elapsed",
                progress.elapsed_minutes, progress.required_minutes
            )
        }),
        error_code: None,
    }
}

// ── Cancel ──────────────────────────────────────────────────────────────────

/// Decide whether the appointment may be cancelled.
///
/// Withdrawn and finished appointments are never cancellable, whatever the
/// actor's privileges. An in-progress appointment needs an admin.
pub fn can_cancel_appointment(appointment: Option<&Appointment>, is_admin: bool) -> CancelDecision {
    let outcome = check_cancel(appointment, is_admin);
    log_outcome("cancel", appointment, &outcome);
    CancelDecision::from_outcome(outcome)
}

fn check_cancel(appointment: Option<&Appointment>, is_admin: bool) -> Result<(), Rejection> {
    let appt = require(appointment)?;

    if appt.status.is_withdrawn() {
        return Err(Rejection::new(
            GateCode::AlreadyCancelled,
            format!("Appointment is already {}", appt.status),
        ));
    }

    if appt.status.is_finished() {
        return Err(Rejection::new(
            GateCode::AlreadyFinished,
            format!("Cannot cancel an appointment that is {}", appt.status),
        ));
    }

    if appt.status == AppointmentStatus::InProgress && !is_admin {
        return Err(Rejection::new(
            GateCode::AdminRequired,
            "Appointment is in progress: complete or terminate it instead \
             (only an administrator can cancel it)",
        ));
    }

    Ok(())
}

// ── Available actions ───────────────────────────────────────────────────────

/// A transition an actor can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    Start,
    AssignToSelf,
    Complete,
    Cancel,
}

/// Everything the gates need to know about who is asking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorContext {
    /// The actor's team-member id, if signed in as one.
    pub team_id: Option<String>,
    /// Qualified for the appointment's speciality (decided elsewhere).
    pub is_qualified: bool,
    pub is_admin: bool,
    /// The actor already has a different appointment in progress.
    pub has_active_appointment: bool,
}

/// The transitions whose gates currently pass for `actor`, in lifecycle order.
pub fn available_actions(
    appointment: &Appointment,
    actor: &ActorContext,
    now: DateTime<Utc>,
    config: &GateConfig,
) -> Vec<GateAction> {
    let appt = Some(appointment);
    let mut actions = Vec::new();

    if check_assign(appt, actor.is_qualified, now, config).is_ok() {
        actions.push(GateAction::AssignToSelf);
    }
    if check_start(
        appt,
        actor.team_id.as_deref(),
        actor.has_active_appointment,
        now,
        config,
    )
    .is_ok()
    {
        actions.push(GateAction::Start);
    }
    if can_complete_appointment(appt, now, config).can_complete {
        actions.push(GateAction::Complete);
    }
    if check_cancel(appt, actor.is_admin).is_ok() {
        actions.push(GateAction::Cancel);
    }

    actions
}

fn log_outcome(gate: &str, appointment: Option<&Appointment>, outcome: &Result<(), Rejection>) {
    let id = appointment.map_or("<none>", |a| a.id.as_str());
    match outcome {
        Ok(()) => debug!("{gate} allowed for appointment {id}"),
        Err(r) => debug!("{gate} rejected for appointment {id}: {}", r.code),
    }
}
