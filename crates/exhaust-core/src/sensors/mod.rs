//! Sensor capability traits and error types.
//!
//! The ADC driver itself lives outside this crate. Anything that can return a
//! normalised 16-bit sample for a given channel implements [`AdcReader`]; the
//! LM35 conversion in [`lm35`] turns a temperature/offset pair into Celsius.

pub mod lm35;

use core::fmt;
use thiserror_no_std::Error;

pub use lm35::{celsius_from_raw, read_celsius};

/// Analog inputs wired to the sensor front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcChannel {
    /// LM35 output (ADC0 / GP26)
    Temperature,
    /// Offset reference subtracted from every reading (ADC1 / GP27)
    Offset,
}

impl AdcChannel {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Offset => "offset",
        }
    }
}

impl fmt::Display for AdcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("Failed to read {channel} channel: {details}")]
    ReadFailed {
        channel: AdcChannel,
        details: &'static str,
    },
    #[error("{channel} channel not ready")]
    NotReady { channel: AdcChannel },
}

impl SensorError {
    /// Channel the failure occurred on.
    pub const fn channel(&self) -> AdcChannel {
        match self {
            Self::ReadFailed { channel, .. } | Self::NotReady { channel } => *channel,
        }
    }
}

/// Raw sample source for the temperature front end.
pub trait AdcReader {
    /// Read one normalised 16-bit sample from `channel`.
    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, SensorError>;
}

impl<T: AdcReader + ?Sized> AdcReader for &mut T {
    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, SensorError> {
        (**self).read_raw(channel)
    }
}
