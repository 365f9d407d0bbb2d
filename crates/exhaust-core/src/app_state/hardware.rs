//! Peripheral bundle handed to the active state.
//!
//! The display, the ADC front end and the alarm actuator are owned here and
//! lent to state hooks by `&mut`, so only the state machine's single consumer
//! ever touches them.

use embedded_hal::digital::OutputPin;
use log::{error, info};

use super::MonitorError;
use crate::alarm::Buzzer;
use crate::sensors::AdcReader;
use crate::ui::Surface;

pub struct Hardware<D, S, P> {
    pub display: D,
    pub sensor: S,
    pub buzzer: Buzzer<P>,
}

impl<D, S, P> Hardware<D, S, P>
where
    D: Surface,
    S: AdcReader,
    P: OutputPin,
{
    /// Bundle the peripherals, probing the display first.
    ///
    /// Returns [`MonitorError::DisplayUnavailable`] when no panel answers;
    /// the caller is expected to abort startup.
    pub fn new(mut display: D, sensor: S, pin: P) -> Result<Self, MonitorError> {
        if !display.probe() {
            error!("Display probe failed, aborting startup");
            return Err(MonitorError::DisplayUnavailable);
        }
        let size = display.bounding_box().size;
        info!("Display ready ({}x{})", size.width, size.height);

        Ok(Self {
            display,
            sensor,
            buzzer: Buzzer::new(pin),
        })
    }

    /// Push the current frame to the panel.
    pub fn present(&mut self) -> Result<(), MonitorError> {
        self.display
            .present()
            .map_err(|_| MonitorError::DisplayWrite)
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn buzzer(&self) -> &Buzzer<P> {
        &self.buzzer
    }

    pub fn buzzer_mut(&mut self) -> &mut Buzzer<P> {
        &mut self.buzzer
    }
}
