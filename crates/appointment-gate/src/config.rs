//! Thresholds and the local-day timezone used by the gates.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// Upper bound for every minute threshold: one day.
pub const MAX_THRESHOLD_MINUTES: i64 = 24 * 60;

/// Tunable rule parameters. Defaults reproduce the production rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// How many minutes before `start_time` an appointment may be started.
    pub start_lead_minutes: i64,
    /// How many minutes after `start_time` a staff member may still self-assign.
    pub self_assign_grace_minutes: i64,
    /// Length of one billing unit.
    pub unit_minutes: i64,
    /// Warn when a booking consumes more than this share of the remaining units.
    pub low_balance_ratio: f64,
    /// Zone whose calendar day defines "today".
    pub timezone: Tz,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            start_lead_minutes: 45,
            self_assign_grace_minutes: 15,
            unit_minutes: 15,
            low_balance_ratio: 0.8,
            timezone: Tz::UTC,
        }
    }
}

impl GateConfig {
    /// Default thresholds with a different local timezone.
    pub fn with_timezone(timezone: Tz) -> Self {
        Self {
            timezone,
            ..Self::default()
        }
    }

    /// Check that every threshold is usable.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.unit_minutes <= 0 {
            return Err(GateError::InvalidConfig(format!(
                "unit_minutes must be positive, got {}",
                self.unit_minutes
            )));
        }
        if self.start_lead_minutes < 0 {
            return Err(GateError::InvalidConfig(format!(
                "start_lead_minutes must not be negative, got {}",
                self.start_lead_minutes
            )));
        }
        if self.self_assign_grace_minutes < 0 {
            return Err(GateError::InvalidConfig(format!(
                "self_assign_grace_minutes must not be negative, got {}",
                self.self_assign_grace_minutes
            )));
        }
        for (field, value) in [
            ("unit_minutes", self.unit_minutes),
            ("start_lead_minutes", self.start_lead_minutes),
            ("self_assign_grace_minutes", self.self_assign_grace_minutes),
        ] {
            if value > MAX_THRESHOLD_MINUTES {
                return Err(GateError::InvalidConfig(format!(
                    "{field} must be at most {MAX_THRESHOLD_MINUTES}, got {value}"
                )));
            }
        }
        if !(self.low_balance_ratio > 0.0 && self.low_balance_ratio <= 1.0) {
            return Err(GateError::InvalidConfig(format!(
                "low_balance_ratio must be in (0, 1], got {}",
                self.low_balance_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GateConfig::default();
        assert_eq!(config.start_lead_minutes, 45);
        assert_eq!(config.self_assign_grace_minutes, 15);
        assert_eq!(config.unit_minutes, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: GateConfig =
            serde_json::from_str(r#"{"timezone": "Europe/Berlin", "start_lead_minutes": 30}"#)
                .unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.start_lead_minutes, 30);
        assert_eq!(config.unit_minutes, 15);
    }

    #[test]
    fn test_unknown_timezone_rejected_by_serde() {
        let result: Result<GateConfig, _> = serde_json::from_str(r#"{"timezone": "Mars/Base"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_unit = GateConfig {
            unit_minutes: 0,
            ..GateConfig::default()
        };
        assert!(bad_unit.validate().unwrap_err().to_string().contains("unit_minutes"));

        let bad_ratio = GateConfig {
            low_balance_ratio: 1.5,
            ..GateConfig::default()
        };
        assert!(bad_ratio.validate().unwrap_err().to_string().contains("low_balance_ratio"));

        let nan_ratio = GateConfig {
            low_balance_ratio: f64::NAN,
            ..GateConfig::default()
        };
        assert!(nan_ratio.validate().is_err());

        let negative_lead = GateConfig {
            start_lead_minutes: -1,
            ..GateConfig::default()
        };
        assert!(negative_lead.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_minutes() {
        let huge_unit = GateConfig {
            unit_minutes: i64::MAX / 2,
            ..GateConfig::default()
        };
        let err = huge_unit.validate().unwrap_err().to_string();
        assert!(err.contains("unit_minutes must be at most 1440"), "got: {err}");

        let huge_grace = GateConfig {
            self_assign_grace_minutes: MAX_THRESHOLD_MINUTES + 1,
            ..GateConfig::default()
        };
        assert!(huge_grace
            .validate()
            .unwrap_err()
            .to_string()
            .contains("self_assign_grace_minutes"));

        let full_day = GateConfig {
            unit_minutes: MAX_THRESHOLD_MINUTES,
            start_lead_minutes: MAX_THRESHOLD_MINUTES,
            self_assign_grace_minutes: MAX_THRESHOLD_MINUTES,
            ..GateConfig::default()
        };
        assert!(full_day.validate().is_ok());
    }
}
