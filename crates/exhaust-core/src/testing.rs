//! Test doubles for the hardware capabilities.

use core::convert::Infallible;

use embassy_time::Instant;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::app_state::Hardware;
use crate::framebuffer::FrameBuffer;
use crate::sensors::{AdcChannel, AdcReader, SensorError};

/// ADC double returning a fixed temperature/offset pair.
#[derive(Debug, Default)]
pub struct ScriptedAdc {
    raw_temp: u16,
    offset: u16,
    failing: Option<AdcChannel>,
    reads: usize,
}

impl ScriptedAdc {
    pub fn constant(raw_temp: u16, offset: u16) -> Self {
        Self {
            raw_temp,
            offset,
            ..Self::default()
        }
    }

    /// Raw reading that converts to roughly `celsius` with a zero offset.
    pub fn at_celsius(celsius: f32) -> Self {
        Self::constant(raw_for_celsius(celsius), 0)
    }

    pub fn set_raw(&mut self, raw_temp: u16, offset: u16) {
        self.raw_temp = raw_temp;
        self.offset = offset;
    }

    pub fn set_celsius(&mut self, celsius: f32) {
        self.set_raw(raw_for_celsius(celsius), 0);
    }

    pub fn fail_channel(&mut self, channel: Option<AdcChannel>) {
        self.failing = channel;
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl AdcReader for ScriptedAdc {
    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, SensorError> {
        self.reads += 1;
        if self.failing == Some(channel) {
            return Err(SensorError::ReadFailed {
                channel,
                details: "scripted failure",
            });
        }
        Ok(match channel {
            AdcChannel::Temperature => self.raw_temp,
            AdcChannel::Offset => self.offset,
        })
    }
}

/// Inverse of the LM35 conversion at the default reference voltage.
pub fn raw_for_celsius(celsius: f32) -> u16 {
    let volts = celsius * crate::config::LM35_VOLTS_PER_C;
    let raw = volts / crate::config::ADC_REF_VOLT * crate::config::ADC_FULL_SCALE;
    raw.round().clamp(0.0, 65535.0) as u16
}

/// Output pin double that records its level and rising edges.
#[derive(Debug, Default)]
pub struct RecordingPin {
    high: bool,
    rising_edges: usize,
}

impl RecordingPin {
    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn rising_edges(&self) -> usize {
        self.rising_edges
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.rising_edges += 1;
        }
        self.high = true;
        Ok(())
    }
}

pub type TestHardware = Hardware<FrameBuffer, ScriptedAdc, RecordingPin>;

pub fn hardware_at(celsius: f32) -> TestHardware {
    Hardware::new(
        FrameBuffer::new(),
        ScriptedAdc::at_celsius(celsius),
        RecordingPin::default(),
    )
    .unwrap()
}

pub fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}
