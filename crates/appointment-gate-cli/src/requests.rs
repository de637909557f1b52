//! JSON request shapes accepted on stdin, and their conversion to engine types.

use anyhow::{Context, Result};
use appointment_gate::{
    parse_timestamp, Appointment, AppointmentRecord, BookingRequest, ConflictCandidate,
    UnitBalance,
};
use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub appointment: Option<AppointmentRecord>,
    #[serde(default)]
    pub actor_team_id: Option<String>,
    #[serde(default)]
    pub has_active_appointment: bool,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub appointment: Option<AppointmentRecord>,
    #[serde(default)]
    pub is_qualified: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub appointment: Option<AppointmentRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub appointment: Option<AppointmentRecord>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Shared by `conflicts` and `validate`.
#[derive(Debug, Deserialize)]
pub struct BookingInput {
    pub start_time: String,
    pub end_time: String,
    pub client_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub exclude_id: Option<String>,
    #[serde(default)]
    pub siblings: Vec<AppointmentRecord>,
    #[serde(default)]
    pub available_units: Option<u32>,
    #[serde(default)]
    pub required_units: Option<u32>,
}

/// Parse an optional wire appointment; a missing one stays `None` so the
/// gates can answer `no_appointment`.
pub fn appointment(record: Option<AppointmentRecord>, tz: &Tz) -> Result<Option<Appointment>> {
    record
        .map(|r| {
            let id = r.id.clone();
            r.into_appointment(tz)
                .with_context(|| format!("invalid appointment '{id}'"))
        })
        .transpose()
}

impl BookingInput {
    pub fn booking(&self, tz: &Tz) -> Result<BookingRequest> {
        Ok(BookingRequest {
            start_time: parse_timestamp(&self.start_time, tz).context("invalid start_time")?,
            end_time: parse_timestamp(&self.end_time, tz).context("invalid end_time")?,
            client_id: self.client_id.clone(),
            team_id: self.team_id.clone(),
            exclude_id: self.exclude_id.clone(),
        })
    }

    pub fn candidates(&self, tz: &Tz) -> Result<Vec<ConflictCandidate>> {
        self.siblings
            .iter()
            .cloned()
            .map(|r| {
                let id = r.id.clone();
                r.into_appointment(tz)
                    .map(|a| a.candidate())
                    .with_context(|| format!("invalid sibling '{id}'"))
            })
            .collect()
    }

    pub fn units(&self) -> Option<UnitBalance> {
        UnitBalance::from_parts(self.available_units, self.required_units)
    }
}
