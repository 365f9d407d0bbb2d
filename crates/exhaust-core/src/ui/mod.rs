//! Core UI types shared by the states: button ids, state ids, transition
//! actions, display geometry and the drawing surface.

pub mod canvas;

use core::fmt;
use core::str::FromStr;

pub use canvas::{
    Surface, clear, draw_pixel, draw_rect, draw_text, fill_rect, surface_size, text_width,
};

/// Panel width in pixels (SSD1306)
pub const DISPLAY_WIDTH_PX: u32 = 128;

/// Panel height in pixels (SSD1306)
pub const DISPLAY_HEIGHT_PX: u32 = 64;

/// The three front-panel buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Enter,
    Left,
    Right,
}

impl Button {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Enter => "ENTER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a state in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    /// Splash screen shown at power-up
    Start,
    /// Live readout, trend graph and alarm
    Monitor,
    /// Settings menu
    Menu,
}

impl StateId {
    pub const ALL: [StateId; 3] = [StateId::Start, StateId::Monitor, StateId::Menu];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Monitor => "monitor",
            Self::Menu => "menu",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a name does not match any [`StateId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownStateName;

impl FromStr for StateId {
    type Err = UnknownStateName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StateId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or(UnknownStateName)
    }
}

/// Requests a state hook can hand back to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Transition to another state
    GoTo(StateId),
}
