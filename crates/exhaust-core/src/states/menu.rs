//! Settings menu.
//!
//! LEFT and RIGHT move the highlight with wrap-around, ENTER returns to the
//! monitor. The first two entries show the live alarm threshold and the
//! spacing between history points.

use core::fmt::Write;

use embassy_time::Instant;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::digital::OutputPin;
use heapless::String;
use log::{debug, info};

use super::constants::{LABEL_LEN, MENU_ROW_HEIGHT_PX, MENU_TEXT_X_PX};
use super::state::{State, display_err};
use crate::app_state::{Hardware, MonitorError};
use crate::config::MonitorConfig;
use crate::sensors::AdcReader;
use crate::ui::{Action, Button, StateId, Surface, clear, draw_text, fill_rect, surface_size};

/// Menu rows, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    AlarmTemp,
    GraphTime,
    Info,
    Exit,
}

impl MenuEntry {
    pub const ALL: [MenuEntry; 4] = [
        MenuEntry::AlarmTemp,
        MenuEntry::GraphTime,
        MenuEntry::Info,
        MenuEntry::Exit,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Text shown for this row under `config`.
    pub fn label(self, config: &MonitorConfig) -> String<LABEL_LEN> {
        let mut label = String::new();
        match self {
            MenuEntry::AlarmTemp => {
                write!(label, "Alarm temp {:.0}C", config.alarm_temp_c).ok();
            }
            MenuEntry::GraphTime => {
                write!(label, "Graph time {}s", config.history_spacing().as_secs()).ok();
            }
            MenuEntry::Info => {
                label.push_str("Info").ok();
            }
            MenuEntry::Exit => {
                label.push_str("Exit").ok();
            }
        }
        label
    }
}

pub struct MenuState {
    config: MonitorConfig,
    selected: usize,
}

impl MenuState {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            selected: 0,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> MenuEntry {
        MenuEntry::ALL[self.selected]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % MenuEntry::COUNT;
    }

    pub fn select_previous(&mut self) {
        self.selected = (self.selected + MenuEntry::COUNT - 1) % MenuEntry::COUNT;
    }

    fn render<D: Surface>(&self, display: &mut D) -> Result<(), MonitorError> {
        clear(display).map_err(display_err)?;
        let width = surface_size(display).width;

        for (index, entry) in MenuEntry::ALL.into_iter().enumerate() {
            let top = index as i32 * MENU_ROW_HEIGHT_PX as i32;
            let selected = index == self.selected;
            if selected {
                let bar = Rectangle::new(Point::new(0, top), Size::new(width, MENU_ROW_HEIGHT_PX));
                fill_rect(display, bar, BinaryColor::On).map_err(display_err)?;
            }
            let label = entry.label(&self.config);
            draw_text(
                display,
                &label,
                Point::new(MENU_TEXT_X_PX, top),
                &FONT_6X10,
                selected,
            )
            .map_err(display_err)?;
        }
        Ok(())
    }

    fn redraw<D, S, P>(&self, hardware: &mut Hardware<D, S, P>) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        self.render(&mut hardware.display)?;
        hardware.present()
    }
}

impl State for MenuState {
    fn id(&self) -> StateId {
        StateId::Menu
    }

    fn enter<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        _now: Instant,
    ) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        self.redraw(hardware)
    }

    fn button_pressed<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        button: Button,
        _now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        match button {
            Button::Left => self.select_previous(),
            Button::Right => self.select_next(),
            Button::Enter => {
                info!("Menu closed on {:?}", self.selected_entry());
                return Ok(Some(Action::GoTo(StateId::Monitor)));
            }
        }
        debug!("Menu selection {}", self.selected);
        self.redraw(hardware)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, hardware_at};

    #[test]
    fn labels_show_live_config() {
        let config = MonitorConfig::default();
        assert_eq!(MenuEntry::AlarmTemp.label(&config).as_str(), "Alarm temp 65C");
        assert_eq!(MenuEntry::GraphTime.label(&config).as_str(), "Graph time 7s");
        assert_eq!(MenuEntry::Info.label(&config).as_str(), "Info");
        assert_eq!(MenuEntry::Exit.label(&config).as_str(), "Exit");

        let config = config.with_alarm_temp(80.0).with_hist_interval(1);
        assert_eq!(MenuEntry::AlarmTemp.label(&config).as_str(), "Alarm temp 80C");
        assert_eq!(MenuEntry::GraphTime.label(&config).as_str(), "Graph time 1s");
    }

    #[test]
    fn graph_time_is_history_point_spacing() {
        let config = MonitorConfig::default();
        let label = MenuEntry::GraphTime.label(&config);
        assert_eq!(label.as_str().strip_prefix("Graph time "), Some("7s"));
        assert_ne!(config.history_spacing(), config.graph_span());

        let config = config.with_hist_interval(3);
        assert_eq!(MenuEntry::GraphTime.label(&config).as_str(), "Graph time 3s");
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut hw = hardware_at(20.0);
        let mut menu = MenuState::new(MonitorConfig::default());
        menu.enter(&mut hw, at(0)).unwrap();
        assert_eq!(menu.selected(), 0);

        menu.button_pressed(&mut hw, Button::Left, at(0)).unwrap();
        assert_eq!(menu.selected(), 3);
        assert_eq!(menu.selected_entry(), MenuEntry::Exit);

        menu.button_pressed(&mut hw, Button::Right, at(0)).unwrap();
        assert_eq!(menu.selected(), 0);

        for _ in 0..10 {
            menu.button_pressed(&mut hw, Button::Right, at(0)).unwrap();
            assert!(menu.selected() < MenuEntry::COUNT);
        }
        assert_eq!(menu.selected(), 2);
    }

    #[test]
    fn enter_returns_to_monitor_from_any_row() {
        let mut hw = hardware_at(20.0);
        let mut menu = MenuState::new(MonitorConfig::default());
        menu.enter(&mut hw, at(0)).unwrap();

        for _ in 0..MenuEntry::COUNT {
            assert_eq!(
                menu.button_pressed(&mut hw, Button::Enter, at(0)).unwrap(),
                Some(Action::GoTo(StateId::Monitor))
            );
            menu.select_next();
        }
    }

    #[test]
    fn highlight_follows_selection() {
        let mut hw = hardware_at(20.0);
        let mut menu = MenuState::new(MonitorConfig::default());
        menu.enter(&mut hw, at(0)).unwrap();

        // Left margin of the bar is solid on the selected row only
        assert!(hw.display().is_lit(2, 5));
        assert!(!hw.display().is_lit(2, 15));

        menu.button_pressed(&mut hw, Button::Right, at(0)).unwrap();
        assert!(!hw.display().is_lit(2, 5));
        assert!(hw.display().is_lit(2, 15));
        assert!(hw.display().is_lit(127, 19));
        assert_eq!(hw.display().frames_presented(), 2);
    }
}
