//! [`GateEngine`]: every operation bound to one [`GateConfig`].

use chrono::{DateTime, Utc};

use crate::config::GateConfig;
use crate::conflict::{detect_conflicts, BookingRequest, ConflictReport};
use crate::duration::{evaluate_duration, time_remaining, DurationProgress};
use crate::error::GateError;
use crate::gate::{
    available_actions, can_assign_to_self, can_cancel_appointment, can_complete_appointment,
    can_start_appointment, ActorContext, AssignDecision, CancelDecision, CompletionDecision,
    GateAction, StartDecision,
};
use crate::model::{Appointment, ConflictCandidate};
use crate::scheduling::{validate_scheduling, SchedulingValidation, UnitBalance};

/// Stateless facade over the gates, the conflict detector, and the validator.
///
/// Holds nothing but configuration, so one engine can be shared freely
/// across request handlers.
#[derive(Debug, Clone, Default)]
pub struct GateEngine {
    config: GateConfig,
}

impl GateEngine {
    /// Build an engine, rejecting unusable thresholds.
    pub fn new(config: GateConfig) -> Result<Self, GateError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn can_start(
        &self,
        appointment: Option<&Appointment>,
        actor_team_id: Option<&str>,
        has_active_appointment: bool,
        now: DateTime<Utc>,
    ) -> StartDecision {
        can_start_appointment(
            appointment,
            actor_team_id,
            has_active_appointment,
            now,
            &self.config,
        )
    }

    pub fn can_assign_to_self(
        &self,
        appointment: Option<&Appointment>,
        is_qualified: bool,
        now: DateTime<Utc>,
    ) -> AssignDecision {
        can_assign_to_self(appointment, is_qualified, now, &self.config)
    }

    pub fn can_complete(
        &self,
        appointment: Option<&Appointment>,
        now: DateTime<Utc>,
    ) -> CompletionDecision {
        can_complete_appointment(appointment, now, &self.config)
    }

    pub fn can_cancel(&self, appointment: Option<&Appointment>, is_admin: bool) -> CancelDecision {
        can_cancel_appointment(appointment, is_admin)
    }

    pub fn available_actions(
        &self,
        appointment: &Appointment,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> Vec<GateAction> {
        available_actions(appointment, actor, now, &self.config)
    }

    pub fn evaluate_duration(
        &self,
        started_at: DateTime<Utc>,
        units_required: u32,
        now: DateTime<Utc>,
    ) -> DurationProgress {
        evaluate_duration(started_at, units_required, now, &self.config)
    }

    pub fn time_remaining(&self, appointment: &Appointment, now: DateTime<Utc>) -> Option<i64> {
        time_remaining(appointment, now, &self.config)
    }

    pub fn detect_conflicts(
        &self,
        request: &BookingRequest,
        siblings: &[ConflictCandidate],
    ) -> ConflictReport {
        detect_conflicts(request, siblings)
    }

    pub fn validate_scheduling(
        &self,
        request: &BookingRequest,
        siblings: &[ConflictCandidate],
        units: Option<UnitBalance>,
    ) -> SchedulingValidation {
        validate_scheduling(request, siblings, units, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateCode;
    use crate::model::AppointmentStatus;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = GateConfig {
            unit_minutes: -15,
            ..GateConfig::default()
        };
        assert!(matches!(GateEngine::new(config), Err(GateError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_rejects_oversized_unit_minutes() {
        let config = GateConfig {
            unit_minutes: i64::MAX / 2,
            ..GateConfig::default()
        };
        assert!(matches!(GateEngine::new(config), Err(GateError::InvalidConfig(_))));
    }

    #[test]
    fn test_engine_threads_config_through() {
        let engine = GateEngine::new(GateConfig {
            start_lead_minutes: 5,
            unit_minutes: 30,
            ..GateConfig::default()
        })
        .unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let appt = Appointment {
            id: "a1".into(),
            client_id: "c1".into(),
            team_id: Some("t1".into()),
            status: AppointmentStatus::Scheduled,
            start_time: Some(now + Duration::minutes(10)),
            end_time: Some(now + Duration::minutes(70)),
            started_at: None,
            units_required: 2,
            title: None,
        };

        let d = engine.can_start(Some(&appt), Some("t1"), false, now);
        assert_eq!(d.error_code, Some(GateCode::TooEarly));

        let progress = engine.evaluate_duration(now - Duration::minutes(45), 2, now);
        assert_eq!(progress.required_minutes, 60);
        assert!(!progress.has_met_minimum_duration);
    }
}
