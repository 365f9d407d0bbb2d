//! Alarm flags and the buzzer pulse sequencer.
//!
//! [`AlarmState`] latches whether the temperature is over the threshold and
//! whether the user muted it. [`Buzzer`] drives the actuator pin through a
//! fixed on/off pattern using deadlines, so sounding the alarm never blocks
//! the caller.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, info, warn};

use crate::app_state::MonitorError;
use crate::config::{BUZZER_OFF_MS, BUZZER_ON_MS, BUZZER_PULSE_COUNT};

/// Triggered/silenced flags for the over-temperature alarm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmState {
    triggered: bool,
    silenced: bool,
}

impl AlarmState {
    pub const fn new() -> Self {
        Self {
            triggered: false,
            silenced: false,
        }
    }

    /// Re-evaluate against a fresh reading. Returns the new triggered flag.
    ///
    /// Dropping below the threshold clears the mute so the next excursion
    /// sounds again.
    pub fn evaluate(&mut self, temp_c: f32, threshold_c: f32) -> bool {
        let triggered = temp_c >= threshold_c;
        if triggered && !self.triggered {
            info!("Alarm triggered at {:.1}C (threshold {:.1}C)", temp_c, threshold_c);
        } else if !triggered && self.triggered {
            info!("Alarm cleared at {:.1}C", temp_c);
        }
        self.triggered = triggered;
        if !triggered {
            self.silenced = false;
        }
        triggered
    }

    /// Mute an active alarm. Ignored when the alarm is not triggered.
    pub fn silence(&mut self) -> bool {
        if self.triggered {
            self.silenced = true;
        }
        self.silenced
    }

    pub const fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub const fn is_silenced(&self) -> bool {
        self.silenced
    }

    /// Whether the buzzer should sound for the current reading.
    pub const fn should_sound(&self) -> bool {
        self.triggered && !self.silenced
    }
}

/// Number of half-periods (on or off phases) in one pattern.
const PATTERN_PHASES: u8 = BUZZER_PULSE_COUNT * 2;

/// Progress through one alarm pattern.
#[derive(Debug, Clone, Copy)]
struct Pattern {
    /// Current half-period. Even phases are "on", odd phases are "off".
    phase: u8,
    /// When the current phase ends
    phase_ends: Instant,
}

impl Pattern {
    fn phase_duration(phase: u8) -> Duration {
        if phase % 2 == 0 {
            Duration::from_millis(BUZZER_ON_MS)
        } else {
            Duration::from_millis(BUZZER_OFF_MS)
        }
    }
}

/// Deadline-driven pulse sequencer for the alarm actuator.
///
/// [`Buzzer::sound`] starts a pattern of [`BUZZER_PULSE_COUNT`] pulses and
/// returns immediately; [`Buzzer::poll`] advances it and must be called
/// regularly (the state machine does so on every service tick).
pub struct Buzzer<P> {
    pin: P,
    pattern: Option<Pattern>,
    patterns_started: u32,
}

impl<P: OutputPin> Buzzer<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            pattern: None,
            patterns_started: 0,
        }
    }

    fn set(&mut self, on: bool) -> Result<(), MonitorError> {
        self.pin.set_state(PinState::from(on)).map_err(|e| {
            warn!("Buzzer pin write failed: {:?}", e);
            MonitorError::Actuator
        })
    }

    /// Start an alarm pattern. A pattern already in progress is left alone.
    pub fn sound(&mut self, now: Instant) -> Result<(), MonitorError> {
        if self.pattern.is_some() {
            debug!("Buzzer pattern already running");
            return Ok(());
        }
        debug!("Sounding buzzer");
        self.pattern = Some(Pattern {
            phase: 0,
            phase_ends: now + Pattern::phase_duration(0),
        });
        self.patterns_started = self.patterns_started.wrapping_add(1);
        self.set(true)
    }

    /// Advance the pattern to `now`, toggling the pin for every elapsed phase.
    pub fn poll(&mut self, now: Instant) -> Result<(), MonitorError> {
        while let Some(mut pattern) = self.pattern {
            if now < pattern.phase_ends {
                break;
            }

            pattern.phase += 1;
            if pattern.phase >= PATTERN_PHASES {
                self.pattern = None;
                return self.set(false);
            }

            pattern.phase_ends += Pattern::phase_duration(pattern.phase);
            self.pattern = Some(pattern);
            self.set(pattern.phase % 2 == 0)?;
        }
        Ok(())
    }

    /// Abort any running pattern and force the actuator off.
    pub fn silence(&mut self) -> Result<(), MonitorError> {
        if self.pattern.take().is_some() {
            debug!("Buzzer pattern cancelled");
        }
        self.set(false)
    }

    pub fn is_sounding(&self) -> bool {
        self.pattern.is_some()
    }

    /// Number of patterns started since construction.
    pub fn patterns_started(&self) -> u32 {
        self.patterns_started
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
