//! Error types for appointment-gate boundary parsing.
//!
//! Rule violations are not errors: they come back as decisions carrying a
//! [`GateCode`](crate::gate::GateCode). These variants cover input that
//! cannot be interpreted at all.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, GateError>;
