//! Event queue and the single consumer that owns the state machine.
//!
//! Producers (the service timer, button interrupts, the simulator's input
//! thread) only post [`Event`]s. The [`Dispatcher`] drains them one at a
//! time, so a tick and a button press are never handled concurrently.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::Instant;
use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};

use crate::app_state::MonitorError;
use crate::sensors::AdcReader;
use crate::states::StateMachine;
use crate::ui::{Button, Surface};

/// Queue depth for pending events
pub const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Input to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Service tick carrying the current time
    Tick(Instant),
    /// Front-panel press and when it happened
    Button { button: Button, at: Instant },
}

pub type EventChannel = Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_CAPACITY>;
pub type EventSender<'a> = Sender<'a, CriticalSectionRawMutex, Event, EVENT_CHANNEL_CAPACITY>;
pub type EventReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, Event, EVENT_CHANNEL_CAPACITY>;

/// Global event queue
pub static EVENT_CHANNEL: EventChannel = Channel::new();

/// Helper to get an event sender
pub fn event_sender() -> EventSender<'static> {
    EVENT_CHANNEL.sender()
}

/// Helper to get an event receiver
pub fn event_receiver() -> EventReceiver<'static> {
    EVENT_CHANNEL.receiver()
}

/// Queue `event` without blocking. A full queue drops it.
pub fn post(sender: &EventSender<'_>, event: Event) -> bool {
    match sender.try_send(event) {
        Ok(()) => true,
        Err(_) => {
            warn!("Event queue full, dropping {:?}", event);
            false
        }
    }
}

pub struct Dispatcher<D, S, P> {
    machine: StateMachine<D, S, P>,
}

impl<D, S, P> Dispatcher<D, S, P>
where
    D: Surface,
    S: AdcReader,
    P: OutputPin,
{
    pub fn new(machine: StateMachine<D, S, P>) -> Self {
        Self { machine }
    }

    pub fn machine(&self) -> &StateMachine<D, S, P> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut StateMachine<D, S, P> {
        &mut self.machine
    }

    /// Run one event to completion.
    pub fn handle(&mut self, event: Event) -> Result<(), MonitorError> {
        match event {
            Event::Tick(now) => self.machine.update(now),
            Event::Button { button, at } => self.machine.button_pressed(button, at),
        }
    }

    /// Run one event, logging any failure. The next event proceeds regardless.
    pub fn process(&mut self, event: Event) {
        if let Err(e) = self.handle(event) {
            match e {
                MonitorError::DisplayWrite | MonitorError::Actuator => {
                    warn!("Event {:?} failed: {}", event, e)
                }
                _ => error!("Event {:?} failed: {}", event, e),
            }
        }
    }

    /// Process everything currently queued. Returns the number of events
    /// handled.
    pub fn drain(&mut self, receiver: &EventReceiver<'_>) -> usize {
        let mut handled = 0;
        while let Ok(event) = receiver.try_receive() {
            self.process(event);
            handled += 1;
        }
        if handled > 0 {
            debug!("Drained {} events", handled);
        }
        handled
    }

    /// Wait for the next event and process it.
    pub async fn process_next(&mut self, receiver: &EventReceiver<'_>) {
        let event = receiver.receive().await;
        self.process(event);
    }

    /// Dispatcher task body.
    pub async fn run(&mut self, receiver: EventReceiver<'_>) -> ! {
        info!("Dispatcher started");
        loop {
            self.process_next(&receiver).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::framebuffer::FrameBuffer;
    use crate::testing::{RecordingPin, ScriptedAdc, at, hardware_at};
    use crate::ui::StateId;

    fn dispatcher() -> Dispatcher<FrameBuffer, ScriptedAdc, RecordingPin> {
        let machine =
            StateMachine::with_default_states(hardware_at(20.0), MonitorConfig::default()).unwrap();
        Dispatcher::new(machine)
    }

    #[test]
    fn full_queue_drops_events() {
        let channel = EventChannel::new();
        let sender = channel.sender();
        for ms in 0..EVENT_CHANNEL_CAPACITY as u64 {
            assert!(post(&sender, Event::Tick(at(ms))));
        }
        assert!(!post(&sender, Event::Tick(at(99))));
        assert_eq!(channel.len(), EVENT_CHANNEL_CAPACITY);
    }

    #[test]
    fn drain_processes_in_order() {
        let channel = EventChannel::new();
        let sender = channel.sender();
        let mut dispatcher = dispatcher();
        dispatcher
            .machine_mut()
            .go_to_state(StateId::Monitor, at(0))
            .unwrap();

        post(&sender, Event::Tick(at(1000)));
        post(
            &sender,
            Event::Button {
                button: Button::Enter,
                at: at(1010),
            },
        );
        post(
            &sender,
            Event::Button {
                button: Button::Left,
                at: at(1020),
            },
        );

        assert_eq!(dispatcher.drain(&channel.receiver()), 3);
        assert_eq!(dispatcher.machine().current_state(), Some(StateId::Menu));
        assert_eq!(dispatcher.machine().menu().unwrap().selected(), 3);
        assert_eq!(dispatcher.drain(&channel.receiver()), 0);
    }

    #[test]
    fn errors_do_not_stop_processing() {
        let channel = EventChannel::new();
        let sender = channel.sender();
        let mut dispatcher = dispatcher();
        dispatcher
            .machine_mut()
            .go_to_state(StateId::Monitor, at(0))
            .unwrap();
        dispatcher
            .machine_mut()
            .hardware_mut()
            .sensor
            .fail_channel(Some(crate::sensors::AdcChannel::Temperature));

        post(&sender, Event::Tick(at(1000)));
        post(&sender, Event::Tick(at(2000)));
        assert_eq!(dispatcher.drain(&channel.receiver()), 2);
        assert_eq!(dispatcher.machine().monitor().unwrap().counter(), 3);
    }

    #[test]
    fn process_next_waits_for_an_event() {
        let channel = EventChannel::new();
        let mut dispatcher = dispatcher();
        channel.try_send(Event::Tick(at(0))).unwrap();
        dispatcher
            .machine_mut()
            .go_to_state(StateId::Start, at(0))
            .unwrap();
        channel.try_send(Event::Tick(at(2000))).unwrap();

        let receiver = channel.receiver();
        embassy_futures::block_on(dispatcher.process_next(&receiver));
        assert_eq!(dispatcher.machine().current_state(), Some(StateId::Start));
        embassy_futures::block_on(dispatcher.process_next(&receiver));
        assert_eq!(dispatcher.machine().current_state(), Some(StateId::Monitor));
    }

    #[test]
    fn global_channel_helpers_share_one_queue() {
        let sender = event_sender();
        let receiver = event_receiver();
        EVENT_CHANNEL.clear();
        assert!(post(&sender, Event::Tick(at(5))));
        assert_eq!(receiver.try_receive().ok(), Some(Event::Tick(at(5))));
    }
}
