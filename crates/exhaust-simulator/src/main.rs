//! Terminal simulator for the exhaust temperature alarm.
//!
//! Runs the exhaust-core state machine on the desktop. The 128x64 panel is
//! drawn with half-block characters, the LM35 is replaced by a first-order
//! thermal model and the buzzer by a logging pin.
//!
//! # Key bindings
//!
//! Type keys followed by Return (the terminal stays in line mode).
//!
//! | Key | Action                          |
//! |-----|---------------------------------|
//! | e   | ENTER button                    |
//! | l   | LEFT button                     |
//! | r   | RIGHT button                    |
//! | +   | Raise exhaust target by 20 C    |
//! | -   | Lower exhaust target by 20 C    |
//! | x   | Toggle an ADC read fault        |
//! | q   | Quit                            |
//!
//! # Environment
//!
//! - `EXHAUST_ALARM_C`: alarm threshold override in Celsius
//! - `EXHAUST_NO_DISPLAY`: make the display probe fail
//! - `RUST_LOG`: log filter (`env_logger`)

use std::convert::Infallible;
use std::io::{BufRead, Write as _};
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, error, info, warn};

use exhaust_core::app_state::{Hardware, MonitorError};
use exhaust_core::config::{
    ADC_FULL_SCALE, ADC_REF_VOLT, LM35_VOLTS_PER_C, MAX_TEMP_C, MonitorConfig, SERVICE_PERIOD_MS,
};
use exhaust_core::dispatcher::{Dispatcher, Event, event_receiver, event_sender, post};
use exhaust_core::framebuffer::FrameBuffer;
use exhaust_core::sensors::{AdcChannel, AdcReader, SensorError};
use exhaust_core::states::StateMachine;
use exhaust_core::ui::{Button, DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, StateId, Surface};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Service tick pacing.
const FRAME_DURATION: Duration = Duration::from_millis(SERVICE_PERIOD_MS);

/// Exhaust temperature at idle.
const AMBIENT_C: f32 = 25.0;

/// Step applied by the `+` and `-` keys.
const TARGET_STEP_C: f32 = 20.0;

/// Fraction of the gap to the target closed per sample.
const THERMAL_RESPONSE: f32 = 0.15;

/// Constant offset reading on the reference channel.
const OFFSET_RAW: u16 = 120;

const COMMAND_CHANNEL_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Operator commands
// ---------------------------------------------------------------------------

/// Simulator-only inputs from the keyboard thread.
#[derive(Debug, Clone, Copy)]
enum SimCommand {
    Heat,
    Cool,
    ToggleFault,
    Quit,
}

static SIM_COMMANDS: Channel<CriticalSectionRawMutex, SimCommand, COMMAND_CHANNEL_CAPACITY> =
    Channel::new();

fn send_command(command: SimCommand) {
    if SIM_COMMANDS.try_send(command).is_err() {
        warn!("Command queue full, dropping {:?}", command);
    }
}

/// Read stdin line by line and turn keys into button events or commands.
fn spawn_keyboard_thread() {
    std::thread::spawn(|| {
        let sender = event_sender();
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            for key in line.chars() {
                let button = match key.to_ascii_lowercase() {
                    'e' => Some(Button::Enter),
                    'l' => Some(Button::Left),
                    'r' => Some(Button::Right),
                    '+' => {
                        send_command(SimCommand::Heat);
                        None
                    }
                    '-' => {
                        send_command(SimCommand::Cool);
                        None
                    }
                    'x' => {
                        send_command(SimCommand::ToggleFault);
                        None
                    }
                    'q' => {
                        send_command(SimCommand::Quit);
                        return;
                    }
                    c if c.is_whitespace() => None,
                    other => {
                        warn!("Unknown key '{}'", other);
                        None
                    }
                };
                if let Some(button) = button {
                    post(
                        &sender,
                        Event::Button {
                            button,
                            at: Instant::now(),
                        },
                    );
                }
            }
        }
        // stdin closed
        send_command(SimCommand::Quit);
    });
}

// ---------------------------------------------------------------------------
// Mock LM35 front end
// ---------------------------------------------------------------------------

/// Thermal model standing in for the LM35 and its offset reference.
struct MockExhaust {
    celsius: f32,
    target_c: f32,
    samples: u32,
    fault: bool,
}

impl MockExhaust {
    fn new() -> Self {
        Self {
            celsius: AMBIENT_C,
            target_c: AMBIENT_C,
            samples: 0,
            fault: false,
        }
    }

    fn apply(&mut self, command: SimCommand) {
        match command {
            SimCommand::Heat => {
                self.target_c = (self.target_c + TARGET_STEP_C).min(MAX_TEMP_C);
                info!("Exhaust target {:.0}C", self.target_c);
            }
            SimCommand::Cool => {
                self.target_c = (self.target_c - TARGET_STEP_C).max(AMBIENT_C);
                info!("Exhaust target {:.0}C", self.target_c);
            }
            SimCommand::ToggleFault => {
                self.fault = !self.fault;
                info!("ADC fault {}", if self.fault { "on" } else { "off" });
            }
            SimCommand::Quit => {}
        }
    }

    /// Advance the model by one sample and return the new temperature.
    fn step(&mut self) -> f32 {
        self.samples = self.samples.wrapping_add(1);
        self.celsius += (self.target_c - self.celsius) * THERMAL_RESPONSE;
        // Engine ripple
        let ripple = 0.8 * (self.samples as f32 / 5.0).sin();
        (self.celsius + ripple).max(0.0)
    }

    fn raw_for(celsius: f32) -> u16 {
        let counts = celsius * LM35_VOLTS_PER_C / ADC_REF_VOLT * ADC_FULL_SCALE;
        (counts.round() as u32 + u32::from(OFFSET_RAW)).min(u32::from(u16::MAX)) as u16
    }
}

impl AdcReader for MockExhaust {
    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, SensorError> {
        if self.fault {
            return Err(SensorError::ReadFailed {
                channel,
                details: "simulated fault",
            });
        }
        match channel {
            AdcChannel::Temperature => Ok(Self::raw_for(self.step())),
            AdcChannel::Offset => Ok(OFFSET_RAW),
        }
    }
}

// ---------------------------------------------------------------------------
// Buzzer
// ---------------------------------------------------------------------------

/// Output pin that logs edges instead of driving a transducer.
#[derive(Default)]
struct LogBuzzer {
    high: bool,
}

impl ErrorType for LogBuzzer {
    type Error = Infallible;
}

impl OutputPin for LogBuzzer {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            debug!("Buzzer off");
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            debug!("Buzzer on");
        }
        self.high = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Terminal panel
// ---------------------------------------------------------------------------

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// Pixel mirror of the panel, printed with half-block characters.
struct TerminalPanel {
    pixels: [[bool; WIDTH]; HEIGHT],
}

impl TerminalPanel {
    fn new() -> Self {
        Self {
            pixels: [[false; WIDTH]; HEIGHT],
        }
    }

    /// Two pixel rows per text line.
    fn render(&self) -> String {
        let mut out = String::with_capacity((WIDTH + 4) * (HEIGHT / 2 + 2));
        out.push('+');
        out.extend(std::iter::repeat_n('-', WIDTH));
        out.push_str("+\n");
        for rows in self.pixels.chunks(2) {
            out.push('|');
            for x in 0..WIDTH {
                let upper = rows[0][x];
                let lower = rows.get(1).is_some_and(|row| row[x]);
                out.push(match (upper, lower) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push_str("|\n");
        }
        out.push('+');
        out.extend(std::iter::repeat_n('-', WIDTH));
        out.push('+');
        out
    }
}

impl OriginDimensions for TerminalPanel {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for TerminalPanel {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y))
                && x < WIDTH
                && y < HEIGHT
            {
                self.pixels[y][x] = color.is_on();
            }
        }
        Ok(())
    }
}

/// Framebuffer in front of the terminal panel, flushed on `present`.
struct SimDisplay {
    buffer: FrameBuffer,
    panel: TerminalPanel,
    connected: bool,
}

impl SimDisplay {
    fn new(connected: bool) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            panel: TerminalPanel::new(),
            connected,
        }
    }
}

impl OriginDimensions for SimDisplay {
    fn size(&self) -> Size {
        self.buffer.size()
    }
}

impl DrawTarget for SimDisplay {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.buffer.draw_iter(pixels)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.fill_solid(area, color)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.clear(color)
    }
}

impl Surface for SimDisplay {
    fn present(&mut self) -> Result<(), Self::Error> {
        if self.buffer.dirty_region().is_none() {
            return Ok(());
        }
        self.buffer.flush(&mut self.panel)?;
        self.buffer.present()?;

        let mut stdout = std::io::stdout().lock();
        // Home the cursor and clear before each frame
        let frame = self.panel.render();
        if write!(stdout, "\x1b[H\x1b[2J{frame}\n[e]nter [l]eft [r]ight  [+/-] heat  [x] fault  [q]uit\n")
            .and_then(|()| stdout.flush())
            .is_err()
        {
            debug!("stdout closed");
        }
        Ok(())
    }

    fn probe(&mut self) -> bool {
        self.connected
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Compiled-in defaults with an optional threshold override from the
/// environment.
fn load_config() -> Result<MonitorConfig, String> {
    let mut config = MonitorConfig::default();
    if let Ok(value) = std::env::var("EXHAUST_ALARM_C") {
        let threshold = value
            .trim()
            .parse::<f32>()
            .map_err(|e| format!("EXHAUST_ALARM_C={value:?}: {e}"))?;
        config = config.with_alarm_temp(threshold);
    }
    config.validate().map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting exhaust alarm simulator");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    info!(
        "Alarm at {:.0}C, graph spans {} s",
        config.alarm_temp_c,
        config.graph_span().as_secs()
    );

    let display = SimDisplay::new(std::env::var_os("EXHAUST_NO_DISPLAY").is_none());
    let hardware = match Hardware::new(display, MockExhaust::new(), LogBuzzer::default()) {
        Ok(hardware) => hardware,
        Err(MonitorError::DisplayUnavailable) => {
            error!("No display, giving up");
            std::process::exit(1);
        }
        Err(e) => {
            error!("Hardware init failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut machine = match StateMachine::with_default_states(hardware, config) {
        Ok(machine) => machine,
        Err(e) => {
            error!("State registration failed: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = machine.go_to_state(StateId::Start, Instant::now()) {
        warn!("Start state failed to enter: {}", e);
    }

    let mut dispatcher = Dispatcher::new(machine);
    let sender = event_sender();
    let receiver = event_receiver();
    spawn_keyboard_thread();

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = std::time::Instant::now();

        // --- Operator commands ------------------------------------------
        while let Ok(command) = SIM_COMMANDS.try_receive() {
            if let SimCommand::Quit = command {
                break 'running;
            }
            dispatcher
                .machine_mut()
                .hardware_mut()
                .sensor_mut()
                .apply(command);
        }

        // --- Service tick -------------------------------------------------
        post(&sender, Event::Tick(Instant::now()));
        dispatcher.drain(&receiver);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    if let Err(e) = dispatcher
        .machine_mut()
        .hardware_mut()
        .buzzer_mut()
        .silence()
    {
        warn!("Buzzer shutdown failed: {}", e);
    }
    info!("Simulator exiting");
}
