//! Compiled-in device configuration.
//!
//! All tunables are compile-time constants with validation assertions. The
//! [`MonitorConfig`] value carries them into the states so tests (and the
//! simulator) can run with a different threshold or cadence without touching
//! the constants.

use embassy_time::Duration;
use thiserror_no_std::Error;

// =============================================================================
// Temperature range
// =============================================================================

/// Lower bound of the graphed temperature range in Celsius.
pub const MIN_TEMP_C: f32 = 0.0;

/// Upper bound of the graphed temperature range in Celsius.
/// The graph's vertical scale maps this value to the top of the plot area.
pub const MAX_TEMP_C: f32 = 150.0;

/// Temperature at which the alarm triggers (inclusive).
pub const ALARM_TEMP_C: f32 = 65.0;

const _: () = assert!(MIN_TEMP_C < MAX_TEMP_C);
const _: () = assert!(MIN_TEMP_C <= ALARM_TEMP_C);
const _: () = assert!(ALARM_TEMP_C <= MAX_TEMP_C);

// =============================================================================
// Sampling cadence
// =============================================================================

/// Period of the monitor's sampling tick in milliseconds.
pub const UPDATE_PERIOD_MS: u64 = 1000;

/// A history point is recorded every N sampling ticks.
/// With 128 points and a 1 s tick this gives roughly 15 minutes of graph.
pub const HIST_INTERVAL_TICKS: u32 = 7;

/// Number of samples kept for the trend graph (one per display column).
pub const HISTORY_CAPACITY: usize = 128;

/// How long the splash screen stays up before monitoring starts.
pub const SPLASH_DURATION_MS: u64 = 2000;

/// Period of the service tick that drives all deadlines (sampling timer,
/// splash delay, buzzer pulses).
pub const SERVICE_PERIOD_MS: u64 = 20;

const _: () = assert!(HIST_INTERVAL_TICKS > 0);
const _: () = assert!(SERVICE_PERIOD_MS < UPDATE_PERIOD_MS);

// =============================================================================
// Analog front end
// =============================================================================

/// ADC reference voltage. This is the 3.3 V ADC reference, not the 5 V rail
/// powering the LM35.
pub const ADC_REF_VOLT: f32 = 3.3;

/// Full-scale value of a 16-bit normalised ADC reading.
pub const ADC_FULL_SCALE: f32 = 65535.0;

/// LM35 output slope: 10 mV per degree Celsius.
pub const LM35_VOLTS_PER_C: f32 = 10.0 / 1000.0;

// =============================================================================
// Buzzer pattern
// =============================================================================

/// Number of on/off pulses per alarm pattern.
pub const BUZZER_PULSE_COUNT: u8 = 4;

/// Time the buzzer stays on per pulse.
pub const BUZZER_ON_MS: u64 = 100;

/// Time the buzzer stays off between pulses.
pub const BUZZER_OFF_MS: u64 = 100;

const _: () = assert!(BUZZER_PULSE_COUNT > 0);
const _: () = assert!(
    (BUZZER_ON_MS + BUZZER_OFF_MS) * BUZZER_PULSE_COUNT as u64 <= UPDATE_PERIOD_MS,
    "an alarm pattern must finish within one sampling period"
);

/// Errors raised by [`MonitorConfig::validate`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Alarm threshold is outside the graphed range
    #[error("Alarm temperature {value}C outside {min}..={max}C")]
    AlarmOutOfRange { value: f32, min: f32, max: f32 },

    /// History interval of zero would divide by zero
    #[error("History interval must be at least one tick")]
    ZeroHistoryInterval,

    /// Sampling period of zero
    #[error("Update period must be non-zero")]
    ZeroUpdatePeriod,

    /// Reference voltage must be positive
    #[error("ADC reference voltage must be positive")]
    InvalidReference,
}

/// Runtime view of the device configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// Alarm threshold in Celsius (inclusive)
    pub alarm_temp_c: f32,
    /// Record a history sample every N ticks
    pub hist_interval: u32,
    /// Sampling tick period
    pub update_period: Duration,
    /// ADC reference voltage
    pub adc_ref_volt: f32,
    /// Top of the graph scale in Celsius
    pub max_temp_c: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            alarm_temp_c: ALARM_TEMP_C,
            hist_interval: HIST_INTERVAL_TICKS,
            update_period: Duration::from_millis(UPDATE_PERIOD_MS),
            adc_ref_volt: ADC_REF_VOLT,
            max_temp_c: MAX_TEMP_C,
        }
    }
}

impl MonitorConfig {
    pub fn with_alarm_temp(mut self, alarm_temp_c: f32) -> Self {
        self.alarm_temp_c = alarm_temp_c;
        self
    }

    pub fn with_hist_interval(mut self, ticks: u32) -> Self {
        self.hist_interval = ticks;
        self
    }

    pub fn with_update_period(mut self, period: Duration) -> Self {
        self.update_period = period;
        self
    }

    /// Check the configuration, returning it unchanged when valid.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(MIN_TEMP_C..=self.max_temp_c).contains(&self.alarm_temp_c) {
            return Err(ConfigError::AlarmOutOfRange {
                value: self.alarm_temp_c,
                min: MIN_TEMP_C,
                max: self.max_temp_c,
            });
        }
        if self.hist_interval == 0 {
            return Err(ConfigError::ZeroHistoryInterval);
        }
        if self.update_period.as_ticks() == 0 {
            return Err(ConfigError::ZeroUpdatePeriod);
        }
        if self.adc_ref_volt <= 0.0 {
            return Err(ConfigError::InvalidReference);
        }
        Ok(self)
    }

    /// Time between two recorded history points.
    pub fn history_spacing(&self) -> Duration {
        self.update_period * self.hist_interval
    }

    /// Total time covered by a full history buffer.
    pub fn graph_span(&self) -> Duration {
        self.history_spacing() * HISTORY_CAPACITY as u32
    }
}
