//! Application-wide error type and the hardware context shared by the states.

mod hardware;

pub use hardware::*;

use thiserror_no_std::Error;

use crate::sensors::{AdcChannel, SensorError};

/// Capacity of a state name carried in an error.
pub const STATE_NAME_LEN: usize = 16;

/// State name as reported in errors; longer names are truncated.
pub type StateName = heapless::String<STATE_NAME_LEN>;

/// Copy `name` into a [`StateName`], truncating at a character boundary.
pub fn state_name(name: &str) -> StateName {
    let mut out = StateName::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Unknown state: {0}")]
    UnknownState(StateName),
    #[error("State already registered: {0}")]
    DuplicateState(StateName),
    #[error("State registry is full")]
    RegistryFull,
    #[error("Sensor unavailable on {channel} channel")]
    SensorUnavailable { channel: AdcChannel },
    #[error("Display not detected")]
    DisplayUnavailable,
    #[error("Display write failed")]
    DisplayWrite,
    #[error("Alarm actuator write failed")]
    Actuator,
}

impl From<SensorError> for MonitorError {
    fn from(err: SensorError) -> Self {
        MonitorError::SensorUnavailable {
            channel: err.channel(),
        }
    }
}
