//! State abstraction and the enum wrapper the state machine stores.
//!
//! Every screen implements [`State`]. Hooks receive the shared
//! [`Hardware`] context and the time carried by the event being processed;
//! none of them block. Transitions are requested by returning an
//! [`Action`] and applied by the [`StateMachine`](super::StateMachine).
//!
//! [`StateWrapper`] holds one concrete state per variant so the registry is
//! a plain `heapless::Vec` without trait objects.

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;

use crate::app_state::{Hardware, MonitorError};
use crate::sensors::AdcReader;
use crate::ui::{Action, Button, StateId, Surface};

use super::{MenuState, MonitorState, StartState};

extern crate alloc;
use alloc::boxed::Box;

/// Map any draw target error into [`MonitorError::DisplayWrite`].
pub(crate) fn display_err<E>(_: E) -> MonitorError {
    MonitorError::DisplayWrite
}

// ---------------------------------------------------------------------------
// State trait
// ---------------------------------------------------------------------------

/// Lifecycle contract for a screen.
///
/// The machine calls `exit` on the outgoing state before `enter` on the
/// incoming one. `update` runs on every service tick while the state is
/// current, `button_pressed` on every front-panel press.
pub trait State {
    fn id(&self) -> StateId;

    fn name(&self) -> &'static str {
        self.id().name()
    }

    fn enter<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        now: Instant,
    ) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin;

    fn exit<D, S, P>(
        &mut self,
        _hardware: &mut Hardware<D, S, P>,
        _now: Instant,
    ) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        Ok(())
    }

    fn update<D, S, P>(
        &mut self,
        _hardware: &mut Hardware<D, S, P>,
        _now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        Ok(None)
    }

    fn button_pressed<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        button: Button,
        now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin;
}

// ---------------------------------------------------------------------------
// Blanket impl: Box<T> where T: State
// ---------------------------------------------------------------------------

impl<T: State> State for Box<T> {
    fn id(&self) -> StateId {
        (**self).id()
    }

    fn name(&self) -> &'static str {
        (**self).name()
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
        (**self).enter(hardware, now)
    }

    fn exit<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        now: Instant,
    ) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        (**self).exit(hardware, now)
    }

    fn update<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        (**self).update(hardware, now)
    }

    fn button_pressed<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        button: Button,
        now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        (**self).button_pressed(hardware, button, now)
    }
}

// ---------------------------------------------------------------------------
// StateWrapper
// ---------------------------------------------------------------------------

/// One of the concrete screens, boxed to keep the enum small.
///
/// Adding a screen means adding a variant here and a match arm in each
/// delegating method below.
pub enum StateWrapper {
    Start(Box<StartState>),
    Monitor(Box<MonitorState>),
    Menu(Box<MenuState>),
}

impl StateWrapper {
    pub fn as_monitor(&self) -> Option<&MonitorState> {
        match self {
            StateWrapper::Monitor(state) => Some(state.as_ref()),
            _ => None,
        }
    }

    pub fn as_menu(&self) -> Option<&MenuState> {
        match self {
            StateWrapper::Menu(state) => Some(state.as_ref()),
            _ => None,
        }
    }
}

impl From<StartState> for StateWrapper {
    fn from(state: StartState) -> Self {
        StateWrapper::Start(Box::new(state))
    }
}

impl From<MonitorState> for StateWrapper {
    fn from(state: MonitorState) -> Self {
        StateWrapper::Monitor(Box::new(state))
    }
}

impl From<MenuState> for StateWrapper {
    fn from(state: MenuState) -> Self {
        StateWrapper::Menu(Box::new(state))
    }
}

impl State for StateWrapper {
    fn id(&self) -> StateId {
        match self {
            StateWrapper::Start(state) => state.id(),
            StateWrapper::Monitor(state) => state.id(),
            StateWrapper::Menu(state) => state.id(),
        }
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
        match self {
            StateWrapper::Start(state) => state.enter(hardware, now),
            StateWrapper::Monitor(state) => state.enter(hardware, now),
            StateWrapper::Menu(state) => state.enter(hardware, now),
        }
    }

    fn exit<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        now: Instant,
    ) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        match self {
            StateWrapper::Start(state) => state.exit(hardware, now),
            StateWrapper::Monitor(state) => state.exit(hardware, now),
            StateWrapper::Menu(state) => state.exit(hardware, now),
        }
    }

    fn update<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        match self {
            StateWrapper::Start(state) => state.update(hardware, now),
            StateWrapper::Monitor(state) => state.update(hardware, now),
            StateWrapper::Menu(state) => state.update(hardware, now),
        }
    }

    fn button_pressed<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        button: Button,
        now: Instant,
    ) -> Result<Option<Action>, MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        match self {
            StateWrapper::Start(state) => state.button_pressed(hardware, button, now),
            StateWrapper::Monitor(state) => state.button_pressed(hardware, button, now),
            StateWrapper::Menu(state) => state.button_pressed(hardware, button, now),
        }
    }
}
