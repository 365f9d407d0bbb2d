//! Screen states and the machine that switches between them.

pub mod constants;
pub mod menu;
pub mod monitor;
pub mod start;
pub mod state;
pub mod state_machine;

pub use menu::{MenuEntry, MenuState};
pub use monitor::MonitorState;
pub use start::StartState;
pub use state::{State, StateWrapper};
pub use state_machine::{MAX_STATES, StateMachine};
