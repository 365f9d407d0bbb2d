//! Deadline-driven periodic timer.
//!
//! Nothing here waits. The owner calls [`PeriodicTimer::poll`] with the
//! current time and gets `true` once per elapsed period. Stopping the timer
//! is a plain field update, so no callback can fire after `stop` returns.

use embassy_time::{Duration, Instant};
use log::debug;

#[derive(Debug, Clone, Copy)]
pub struct PeriodicTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl PeriodicTimer {
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    /// Arm the timer; the first expiry is one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    /// Disarm the timer.
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Returns `true` if a period has elapsed by `now`.
    ///
    /// Expiries missed while the caller was busy are coalesced into one; the
    /// schedule then continues from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let mut next = due + self.period;
        if next <= now {
            debug!(
                "Timer overran by {} ms, skipping missed periods",
                (now - due).as_millis()
            );
            next = now + self.period;
        }
        self.next_due = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::at;

    #[test]
    fn idle_timer_never_fires() {
        let mut timer = PeriodicTimer::new(Duration::from_millis(1000));
        assert!(!timer.poll(at(5000)));
        assert!(!timer.is_running());
    }

    #[test]
    fn fires_once_per_period() {
        let mut timer = PeriodicTimer::new(Duration::from_millis(1000));
        timer.start(at(0));

        let fired = (0..=3000).step_by(20).filter(|&ms| timer.poll(at(ms))).count();
        assert_eq!(fired, 3);
        assert_eq!(timer.next_due(), Some(at(4000)));
    }

    #[test]
    fn keeps_phase_when_polled_late_within_a_period() {
        let mut timer = PeriodicTimer::new(Duration::from_millis(1000));
        timer.start(at(0));
        assert!(timer.poll(at(1015)));
        assert_eq!(timer.next_due(), Some(at(2000)));
    }

    #[test]
    fn coalesces_missed_periods() {
        let mut timer = PeriodicTimer::new(Duration::from_millis(1000));
        timer.start(at(0));
        assert!(timer.poll(at(5500)));
        assert!(!timer.poll(at(5600)));
        assert_eq!(timer.next_due(), Some(at(6500)));
    }

    #[test]
    fn stop_disarms() {
        let mut timer = PeriodicTimer::new(Duration::from_millis(1000));
        timer.start(at(0));
        timer.stop();
        assert!(!timer.poll(at(1000)));
    }
}
