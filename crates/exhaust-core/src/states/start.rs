//! Power-up splash screen.
//!
//! Shows the product name and firmware version, pulses the buzzer once as a
//! self-test and hands over to the monitor when the splash deadline passes.

use core::fmt::Write;

use embassy_time::{Duration, Instant};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X15};
use embedded_graphics::prelude::*;
use embedded_hal::digital::OutputPin;
use heapless::String;
use log::{debug, info};

use super::constants::{LABEL_LEN, SPLASH_TITLE_ROWS_PX, SPLASH_VERSION_ROW_PX};
use super::state::{State, display_err};
use crate::app_state::{Hardware, MonitorError};
use crate::config::SPLASH_DURATION_MS;
use crate::sensors::AdcReader;
use crate::ui::{Action, Button, StateId, Surface, clear, draw_rect, draw_text, text_width};

const TITLE_LINES: [&str; 3] = ["Exhaust", "temperature", "alarm"];

pub struct StartState {
    splash: Duration,
    deadline: Option<Instant>,
}

impl Default for StartState {
    fn default() -> Self {
        Self::new(Duration::from_millis(SPLASH_DURATION_MS))
    }
}

impl StartState {
    pub fn new(splash: Duration) -> Self {
        Self {
            splash,
            deadline: None,
        }
    }

    /// When the splash hands over to the monitor, if it is showing.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn draw_centered<D: Surface>(
        display: &mut D,
        text: &str,
        top: i32,
        font: &MonoFont<'_>,
    ) -> Result<(), MonitorError> {
        let width = display.bounding_box().size.width;
        let x = width.saturating_sub(text_width(text, font)) / 2;
        draw_text(display, text, Point::new(x as i32, top), font, false).map_err(display_err)
    }

    fn render<D: Surface>(&self, display: &mut D) -> Result<(), MonitorError> {
        let bounds = display.bounding_box();
        clear(display).map_err(display_err)?;
        draw_rect(display, bounds).map_err(display_err)?;

        for (line, top) in TITLE_LINES.iter().zip(SPLASH_TITLE_ROWS_PX) {
            Self::draw_centered(display, line, top, &FONT_9X15)?;
        }

        let mut version: String<LABEL_LEN> = String::new();
        write!(version, "Version {}", env!("CARGO_PKG_VERSION")).ok();
        Self::draw_centered(display, &version, SPLASH_VERSION_ROW_PX, &FONT_6X10)
    }
}

impl State for StartState {
    fn id(&self) -> StateId {
        StateId::Start
    }

    fn enter<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        now: Instant,
    ) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        info!("Splash for {} ms", self.splash.as_millis());
        self.deadline = Some(now + self.splash);
        self.render(&mut hardware.display)?;
        hardware.present()?;
        hardware.buzzer.sound(now)
    }

    fn exit<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        _now: Instant,
    ) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        self.deadline = None;
        clear(&mut hardware.display).map_err(display_err)?;
        hardware.present()
    }

    fn update<D, S, P>(
        &mut self,
        _hardware: &mut Hardware<D, S, P>,
        now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Ok(Some(Action::GoTo(StateId::Monitor)))
            }
            _ => Ok(None),
        }
    }

    fn button_pressed<D, S, P>(
        &mut self,
        _hardware: &mut Hardware<D, S, P>,
        button: Button,
        _now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        debug!("{} ignored during splash", button);
        Ok(None)
    }
}
