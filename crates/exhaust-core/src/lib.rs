//! Hardware-independent core of the exhaust temperature alarm.
//!
//! The device samples an LM35 on the exhaust manifold once a second, shows
//! the reading and a ~15 minute trend graph on a 128x64 monochrome panel and
//! pulses a buzzer when the temperature reaches the alarm threshold. Three
//! buttons silence the alarm and drive a small menu.
//!
//! Everything here is `no_std` with `extern crate alloc`. Peripherals enter
//! through capability traits ([`sensors::AdcReader`], [`ui::Surface`] and
//! `embedded_hal::digital::OutputPin`) so the same state machine runs on the
//! board, in the desktop simulator and in host tests.
//!
//! Time never comes from a clock inside this crate. Every
//! [`dispatcher::Event`] carries an `embassy_time::Instant`, and sampling,
//! the splash delay and buzzer pulses are deadlines compared against it.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod alarm;
pub mod app_state;
pub mod config;
pub mod dispatcher;
pub mod framebuffer;
pub mod history;
pub mod sensors;
pub mod states;
pub mod timer;
pub mod ui;

#[cfg(test)]
mod testing;
