//! LM35 temperature conversion.
//!
//! The LM35 outputs 10 mV per degree Celsius. Both the sensor and an offset
//! reference are sampled; the offset reading is subtracted before scaling so
//! a common-mode error on the analog ground cancels out.

use log::debug;

use super::{AdcChannel, AdcReader, SensorError};
use crate::config::{ADC_FULL_SCALE, LM35_VOLTS_PER_C};

/// Convert a raw temperature/offset pair into degrees Celsius.
///
/// The subtraction is signed, so an offset larger than the reading yields a
/// negative temperature instead of wrapping.
pub fn celsius_from_raw(raw_temp: u16, offset: u16, adc_ref_volt: f32) -> f32 {
    let measurement = i32::from(raw_temp) - i32::from(offset);
    let voltage = measurement as f32 * adc_ref_volt / ADC_FULL_SCALE;
    voltage / LM35_VOLTS_PER_C
}

/// Sample both channels and return the temperature in Celsius.
pub fn read_celsius<R: AdcReader>(reader: &mut R, adc_ref_volt: f32) -> Result<f32, SensorError> {
    let raw_temp = reader.read_raw(AdcChannel::Temperature)?;
    let offset = reader.read_raw(AdcChannel::Offset)?;
    let celsius = celsius_from_raw(raw_temp, offset, adc_ref_volt);
    debug!(
        "LM35 raw={} offset={} -> {:.1}C",
        raw_temp, offset, celsius
    );
    Ok(celsius)
}
