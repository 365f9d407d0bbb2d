//! State registry with exit-then-enter transitions.

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;
use heapless::Vec;
use log::{debug, info, warn};

use super::state::{State, StateWrapper};
use super::{MenuState, MonitorState, StartState};
use crate::app_state::{Hardware, MonitorError, state_name};
use crate::config::MonitorConfig;
use crate::sensors::AdcReader;
use crate::ui::{Action, Button, StateId, Surface};

/// Registry capacity.
pub const MAX_STATES: usize = 4;

/// Owns the registered states, the current state id and the hardware.
pub struct StateMachine<D, S, P> {
    states: Vec<StateWrapper, MAX_STATES>,
    current: Option<StateId>,
    hardware: Hardware<D, S, P>,
}

impl<D, S, P> StateMachine<D, S, P>
where
    D: Surface,
    S: AdcReader,
    P: OutputPin,
{
    /// Empty machine; no state is current until the first transition.
    pub fn new(hardware: Hardware<D, S, P>) -> Self {
        Self {
            states: Vec::new(),
            current: None,
            hardware,
        }
    }

    /// Machine with the start, monitor and menu states registered.
    pub fn with_default_states(
        hardware: Hardware<D, S, P>,
        config: MonitorConfig,
    ) -> Result<Self, MonitorError> {
        let mut machine = Self::new(hardware);
        machine.add_state(StartState::default().into())?;
        machine.add_state(MonitorState::new(config).into())?;
        machine.add_state(MenuState::new(config).into())?;
        Ok(machine)
    }

    /// Register a state under its id.
    pub fn add_state(&mut self, state: StateWrapper) -> Result<(), MonitorError> {
        let id = state.id();
        if self.index_of(id).is_some() {
            warn!("State {} already registered", id);
            return Err(MonitorError::DuplicateState(state_name(id.name())));
        }
        self.states
            .push(state)
            .map_err(|_| MonitorError::RegistryFull)?;
        debug!("Registered state {}", id);
        Ok(())
    }

    fn index_of(&self, id: StateId) -> Option<usize> {
        self.states.iter().position(|s| s.id() == id)
    }

    fn current_index(&self) -> Option<usize> {
        self.current.and_then(|id| self.index_of(id))
    }

    /// Exit the current state and enter `id`.
    ///
    /// An unregistered `id` fails before anything runs, leaving the current
    /// state untouched.
    pub fn go_to_state(&mut self, id: StateId, now: Instant) -> Result<(), MonitorError> {
        let Some(next) = self.index_of(id) else {
            warn!("Transition to unregistered state {}", id);
            return Err(MonitorError::UnknownState(state_name(id.name())));
        };

        if let Some(current) = self.current_index() {
            let from = self.states[current].id();
            info!("State {} -> {}", from, id);
            if let Err(e) = self.states[current].exit(&mut self.hardware, now) {
                warn!("Exit from {} failed: {}", from, e);
            }
        } else {
            info!("State -> {}", id);
        }

        self.current = Some(id);
        self.states[next].enter(&mut self.hardware, now)
    }

    /// Transition by state name (`"start"`, `"monitor"`, `"menu"`).
    pub fn go_to_state_named(&mut self, name: &str, now: Instant) -> Result<(), MonitorError> {
        match name.parse::<StateId>() {
            Ok(id) => self.go_to_state(id, now),
            Err(_) => {
                warn!("Transition to unknown state \"{}\"", name);
                Err(MonitorError::UnknownState(state_name(name)))
            }
        }
    }

    fn apply(&mut self, action: Option<Action>, now: Instant) -> Result<(), MonitorError> {
        match action {
            Some(Action::GoTo(id)) => self.go_to_state(id, now),
            None => Ok(()),
        }
    }

    /// Service tick: advance the buzzer, then the current state.
    pub fn update(&mut self, now: Instant) -> Result<(), MonitorError> {
        let polled = self.hardware.buzzer.poll(now);

        if let Some(index) = self.current_index() {
            let action = self.states[index].update(&mut self.hardware, now)?;
            self.apply(action, now)?;
        }
        polled
    }

    /// Route a front-panel press to the current state.
    pub fn button_pressed(&mut self, button: Button, now: Instant) -> Result<(), MonitorError> {
        let Some(index) = self.current_index() else {
            debug!("{} pressed with no current state", button);
            return Ok(());
        };
        debug!("{} pressed in {}", button, self.states[index].name());
        let action = self.states[index].button_pressed(&mut self.hardware, button, now)?;
        self.apply(action, now)
    }

    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    pub fn hardware(&self) -> &Hardware<D, S, P> {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware<D, S, P> {
        &mut self.hardware
    }

    /// The registered monitor state, if any.
    pub fn monitor(&self) -> Option<&MonitorState> {
        self.states.iter().find_map(StateWrapper::as_monitor)
    }

    pub fn menu(&self) -> Option<&MenuState> {
        self.states.iter().find_map(StateWrapper::as_menu)
    }
}
