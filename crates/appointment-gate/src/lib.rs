//! # appointment-gate
//!
//! Deterministic appointment lifecycle gates and booking conflict detection.
//!
//! Given appointment snapshots and a caller-supplied reference clock, the
//! engine decides whether an appointment may be started, self-assigned,
//! completed, or cancelled, and whether a new booking collides with the
//! client's or the team member's existing bookings. It performs no I/O and
//! never reads the system clock.
//!
//! ## Modules
//!
//! - [`time`] — Minute deltas, local calendar days, ISO-8601 boundary parsing
//! - [`model`] — Appointment status, snapshots, conflict candidates, wire records
//! - [`config`] — Rule thresholds and the local timezone
//! - [`gate`] — Start / self-assign / complete / cancel gates
//! - [`duration`] — Elapsed versus required minutes
//! - [`conflict`] — Two-axis interval-overlap detection
//! - [`scheduling`] — Booking validation: conflicts plus unit balance
//! - [`engine`] — [`GateEngine`] facade bound to one config
//! - [`error`] — Error types
//!
//! ## Concurrency
//!
//! Every function is synchronous and side-effect free. Validation runs
//! against the sibling snapshot the caller provides, so a passing result is
//! advisory until the write commits under a serializing transaction or a
//! storage-level uniqueness constraint.

pub mod config;
pub mod conflict;
pub mod duration;
pub mod engine;
pub mod error;
pub mod gate;
pub mod model;
pub mod scheduling;
pub mod time;

pub use config::GateConfig;
pub use conflict::{
    detect_conflicts, has_time_conflict, BookingRequest, ConflictAxis, ConflictReport,
    ConflictingAppointment,
};
pub use duration::{evaluate_duration, required_minutes, time_remaining, DurationProgress};
pub use engine::GateEngine;
pub use error::GateError;
pub use gate::{
    available_actions, can_assign_to_self, can_cancel_appointment, can_complete_appointment,
    can_start_appointment, ActorContext, AssignDecision, CancelDecision, CompletionDecision,
    GateAction, GateCode, StartDecision,
};
pub use model::{Appointment, AppointmentRecord, AppointmentStatus, ConflictCandidate};
pub use scheduling::{validate_scheduling, SchedulingValidation, UnitBalance};
pub use time::{is_same_local_day, minutes_between, parse_timestamp, parse_timezone};
