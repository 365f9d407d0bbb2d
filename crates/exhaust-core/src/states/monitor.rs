//! Live temperature readout, trend graph and over-temperature alarm.
//!
//! While current, the monitor samples the LM35 once per update period. Every
//! `hist_interval`-th sample goes into the history shown as a one pixel per
//! sample graph under the readout, with a dotted line marking the alarm
//! threshold.

use core::fmt::Write;

use embassy_time::Instant;
use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::digital::OutputPin;
use heapless::String;
use log::{debug, info, warn};

use super::constants::{ALARM_LINE_DOT_SPACING_PX, GRAPH_TOP_PX, LABEL_LEN, READOUT_TOP_PX};
use super::state::{State, display_err};
use crate::alarm::AlarmState;
use crate::app_state::{Hardware, MonitorError};
use crate::config::MonitorConfig;
use crate::history::HistoryBuffer;
use crate::sensors::{AdcReader, read_celsius};
use crate::timer::PeriodicTimer;
use crate::ui::{
    Action, Button, StateId, Surface, clear, draw_pixel, draw_rect, draw_text, surface_size,
    text_width,
};

/// Vertical mapping from Celsius to rows inside the graph outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    /// First row inside the outline
    pub top: i32,
    /// Last row inside the outline
    pub bottom: i32,
    /// Rows per degree
    pub scaler: f32,
}

impl PlotArea {
    /// Plot area for a `size` display whose graph scale tops out at
    /// `max_temp_c`.
    pub fn new(size: Size, max_temp_c: f32) -> Self {
        let top = GRAPH_TOP_PX + 1;
        let bottom = size.height as i32 - 2;
        Self {
            top,
            bottom,
            scaler: (bottom - top) as f32 / max_temp_c,
        }
    }

    /// Row for `celsius`, clamped inside the outline.
    pub fn row_for(&self, celsius: f32) -> i32 {
        let offset = micromath::F32Ext::round(celsius * self.scaler) as i32;
        (self.bottom - offset).clamp(self.top, self.bottom)
    }
}

pub struct MonitorState {
    config: MonitorConfig,
    counter: u32,
    timer: PeriodicTimer,
    history: HistoryBuffer,
    alarm: AlarmState,
    last_reading: Option<f32>,
}

impl MonitorState {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            counter: 0,
            timer: PeriodicTimer::new(config.update_period),
            history: HistoryBuffer::new(),
            alarm: AlarmState::new(),
            last_reading: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Ticks run since the monitor was last entered.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn alarm(&self) -> &AlarmState {
        &self.alarm
    }

    /// Temperature from the most recent tick, `None` if that read failed.
    pub fn last_reading(&self) -> Option<f32> {
        self.last_reading
    }

    pub fn is_sampling(&self) -> bool {
        self.timer.is_running()
    }

    /// Sample, update history and alarm, redraw.
    fn tick<D, S, P>(
        &mut self,
        hardware: &mut Hardware<D, S, P>,
        now: Instant,
    ) -> Result<(), MonitorError>
    where
        D: Surface,
        S: AdcReader,
        P: OutputPin,
    {
        let reading = match read_celsius(&mut hardware.sensor, self.config.adc_ref_volt) {
            Ok(celsius) => Some(celsius),
            Err(e) => {
                let err = MonitorError::from(e);
                warn!("Tick {}: {}", self.counter, err);
                None
            }
        };

        if let Some(celsius) = reading {
            if self.counter % self.config.hist_interval == 0 {
                self.history.push(celsius);
                debug!("History sample {:.1}C ({} stored)", celsius, self.history.len());
            }
            self.alarm.evaluate(celsius, self.config.alarm_temp_c);
        }
        self.last_reading = reading;

        let sounded = if reading.is_some() && self.alarm.should_sound() {
            hardware.buzzer.sound(now)
        } else {
            Ok(())
        };
        let drawn = self
            .render(&mut hardware.display, reading)
            .and_then(|()| hardware.present());

        self.counter = self.counter.wrapping_add(1);
        sounded?;
        drawn
    }

    fn render<D: Surface>(&self, display: &mut D, reading: Option<f32>) -> Result<(), MonitorError> {
        clear(display).map_err(display_err)?;
        let size = surface_size(display);

        let mut readout: String<LABEL_LEN> = String::new();
        match reading {
            Some(celsius) if self.alarm.is_triggered() => {
                write!(readout, "!!! {:.0}C !!!", celsius).ok();
            }
            Some(celsius) => {
                write!(readout, "{:.0}C", celsius).ok();
            }
            None => {
                readout.push_str("--C").ok();
            }
        }
        let x = size.width.saturating_sub(text_width(&readout, &FONT_10X20)) / 2;
        draw_text(
            display,
            &readout,
            Point::new(x as i32, READOUT_TOP_PX),
            &FONT_10X20,
            false,
        )
        .map_err(display_err)?;

        self.draw_graph(display, size)
    }

    fn draw_graph<D: Surface>(&self, display: &mut D, size: Size) -> Result<(), MonitorError> {
        let outline = Rectangle::new(
            Point::new(0, GRAPH_TOP_PX),
            Size::new(size.width, size.height.saturating_sub(GRAPH_TOP_PX as u32)),
        );
        draw_rect(display, outline).map_err(display_err)?;

        let plot = PlotArea::new(size, self.config.max_temp_c);

        let alarm_row = plot.row_for(self.config.alarm_temp_c);
        for x in (0..size.width as i32).step_by(ALARM_LINE_DOT_SPACING_PX) {
            draw_pixel(display, Point::new(x, alarm_row)).map_err(display_err)?;
        }

        for (x, sample) in self.history.iter().enumerate() {
            draw_pixel(display, Point::new(x as i32, plot.row_for(sample))).map_err(display_err)?;
        }
        Ok(())
    }
}

impl State for MonitorState {
    fn id(&self) -> StateId {
        StateId::Monitor
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
        info!(
            "Monitoring every {} ms, alarm at {:.0}C",
            self.config.update_period.as_millis(),
            self.config.alarm_temp_c
        );
        self.counter = 0;
        self.timer.start(now);
        self.tick(hardware, now)
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
        self.timer.stop();
        self.counter = 0;
        hardware.buzzer.silence()
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
        if self.timer.poll(now) {
            self.tick(hardware, now)?;
        }
        Ok(None)
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
        if self.alarm.is_triggered() {
            info!("Alarm silenced by {}", button);
            self.alarm.silence();
            hardware.buzzer.silence()?;
            return Ok(None);
        }

        match button {
            Button::Enter => Ok(Some(Action::GoTo(StateId::Menu))),
            Button::Left | Button::Right => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HISTORY_CAPACITY;
    use crate::sensors::AdcChannel;
    use crate::testing::{TestHardware, at, hardware_at};
    use embassy_time::Duration;

    /// Enter at t=0 and run `ticks` ticks in total, polling at the service
    /// cadence so the buzzer advances like it would on the device.
    fn run_ticks(monitor: &mut MonitorState, hw: &mut TestHardware, ticks: u64) {
        monitor.enter(hw, at(0)).unwrap();
        for ms in (20..(ticks * 1000)).step_by(20) {
            hw.buzzer.poll(at(ms)).unwrap();
            monitor.update(hw, at(ms)).unwrap();
        }
    }

    #[test]
    fn plot_rows_scale_and_clamp() {
        let plot = PlotArea::new(Size::new(128, 64), 150.0);
        assert_eq!((plot.top, plot.bottom), (21, 62));
        assert_eq!(plot.row_for(0.0), 62);
        assert_eq!(plot.row_for(65.0), 44);
        assert_eq!(plot.row_for(150.0), 21);
        assert_eq!(plot.row_for(400.0), 21);
        assert_eq!(plot.row_for(-20.0), 62);
    }

    #[test]
    fn enter_samples_immediately() {
        let mut hw = hardware_at(20.0);
        let mut monitor = MonitorState::new(MonitorConfig::default());
        monitor.enter(&mut hw, at(0)).unwrap();

        assert_eq!(monitor.counter(), 1);
        assert_eq!(monitor.history().len(), 1);
        assert!(monitor.is_sampling());
        assert_eq!(hw.display().frames_presented(), 1);
        assert!((monitor.last_reading().unwrap() - 20.0).abs() < 0.1);
    }

    #[test]
    fn ten_ticks_record_two_history_points() {
        let mut hw = hardware_at(20.0);
        let mut monitor = MonitorState::new(MonitorConfig::default());
        run_ticks(&mut monitor, &mut hw, 10);

        assert_eq!(monitor.counter(), 10);
        assert_eq!(monitor.history().len(), 2);
    }

    #[test]
    fn history_fills_to_capacity_then_evicts() {
        let mut hw = hardware_at(20.0);
        let mut monitor = MonitorState::new(MonitorConfig::default());
        run_ticks(&mut monitor, &mut hw, HISTORY_CAPACITY as u64 * 7);
        assert_eq!(monitor.history().len(), HISTORY_CAPACITY);

        hw.sensor.set_celsius(40.0);
        for ms in ((HISTORY_CAPACITY as u64 * 7000)..=(HISTORY_CAPACITY as u64 * 7000 + 7000))
            .step_by(1000)
        {
            monitor.update(&mut hw, at(ms)).unwrap();
        }
        assert_eq!(monitor.history().len(), HISTORY_CAPACITY);
        assert!((monitor.history().latest().unwrap() - 40.0).abs() < 0.1);
    }

    #[test]
    fn readout_and_graph_are_drawn() {
        let mut hw = hardware_at(20.0);
        let mut monitor = MonitorState::new(MonitorConfig::default());
        run_ticks(&mut monitor, &mut hw, 8);
        let fb = hw.display();

        // Readout above the graph
        let readout = Rectangle::new(Point::zero(), Size::new(128, 20));
        assert!(fb.count_lit(readout) > 0);

        // Outline corners
        assert!(fb.is_lit(0, 20));
        assert!(fb.is_lit(127, 63));

        // Dotted threshold at 65C
        assert!(fb.is_lit(4, 44));
        assert!(!fb.is_lit(5, 44));

        // Second history point at 20C
        assert!(fb.is_lit(1, 57));
        assert!(!fb.is_lit(1, 56));
        assert!(!fb.is_lit(2, 57));
    }

    #[test]
    fn hot_reading_triggers_and_pulses_every_tick() {
        let mut hw = hardware_at(20.0);
        hw.sensor.set_raw(32768, 0);
        let mut monitor = MonitorState::new(MonitorConfig::default());
        run_ticks(&mut monitor, &mut hw, 4);

        assert!(monitor.alarm().is_triggered());
        assert!((monitor.last_reading().unwrap() - 165.0).abs() < 0.1);
        assert_eq!(hw.buzzer().patterns_started(), 4);
    }

    #[test]
    fn any_button_silences_without_leaving() {
        let mut hw = hardware_at(20.0);
        hw.sensor.set_raw(32768, 0);
        let mut monitor = MonitorState::new(MonitorConfig::default());
        monitor.enter(&mut hw, at(0)).unwrap();
        assert!(hw.buzzer().is_sounding());

        let action = monitor
            .button_pressed(&mut hw, Button::Enter, at(50))
            .unwrap();
        assert_eq!(action, None);
        assert!(monitor.alarm().is_silenced());
        assert!(!hw.buzzer().is_sounding());

        // Still hot: stays muted
        monitor.update(&mut hw, at(1000)).unwrap();
        assert_eq!(hw.buzzer().patterns_started(), 1);

        // Cooling clears the mute
        hw.sensor.set_celsius(20.0);
        monitor.update(&mut hw, at(2000)).unwrap();
        assert!(!monitor.alarm().is_triggered());
        assert!(!monitor.alarm().is_silenced());
    }

    #[test]
    fn enter_opens_menu_when_quiet() {
        let mut hw = hardware_at(20.0);
        let mut monitor = MonitorState::new(MonitorConfig::default());
        monitor.enter(&mut hw, at(0)).unwrap();

        assert_eq!(
            monitor.button_pressed(&mut hw, Button::Enter, at(10)).unwrap(),
            Some(Action::GoTo(StateId::Menu))
        );
        assert_eq!(
            monitor.button_pressed(&mut hw, Button::Left, at(10)).unwrap(),
            None
        );
    }

    #[test]
    fn sensor_failure_keeps_history_and_alarm() {
        let mut hw = hardware_at(100.0);
        let mut monitor = MonitorState::new(MonitorConfig::default().with_hist_interval(1));
        monitor.enter(&mut hw, at(0)).unwrap();
        assert!(monitor.alarm().is_triggered());
        let started = hw.buzzer().patterns_started();

        hw.sensor.fail_channel(Some(AdcChannel::Offset));
        hw.buzzer.poll(at(900)).unwrap();
        monitor.update(&mut hw, at(1000)).unwrap();

        assert_eq!(monitor.last_reading(), None);
        assert_eq!(monitor.history().len(), 1);
        assert!(monitor.alarm().is_triggered());
        assert_eq!(hw.buzzer().patterns_started(), started);
        assert_eq!(monitor.counter(), 2);
        // Graph kept
        assert!(hw.display().is_lit(0, 20));
    }

    #[test]
    fn exit_stops_sampling_and_buzzer() {
        let mut hw = hardware_at(20.0);
        hw.sensor.set_raw(32768, 0);
        let mut monitor = MonitorState::new(MonitorConfig::default());
        monitor.enter(&mut hw, at(0)).unwrap();
        monitor.exit(&mut hw, at(100)).unwrap();

        assert!(!monitor.is_sampling());
        assert_eq!(monitor.counter(), 0);
        assert!(!hw.buzzer().is_sounding());
        assert!(!hw.buzzer().pin().is_high());

        let reads = hw.sensor.reads();
        monitor.update(&mut hw, at(5000)).unwrap();
        assert_eq!(hw.sensor.reads(), reads);
    }

    #[test]
    fn slower_period_is_honoured() {
        let mut hw = hardware_at(20.0);
        let config = MonitorConfig::default().with_update_period(Duration::from_millis(2000));
        let mut monitor = MonitorState::new(config);
        monitor.enter(&mut hw, at(0)).unwrap();
        monitor.update(&mut hw, at(1000)).unwrap();
        assert_eq!(monitor.counter(), 1);
        monitor.update(&mut hw, at(2000)).unwrap();
        assert_eq!(monitor.counter(), 2);
    }
}
