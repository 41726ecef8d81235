//! Wall-clock time adapter.
//!
//! [`SystemClock`] implements [`ClockPort`] over `chrono::Utc`.  The control
//! loop ticks on wall-clock second boundaries, so records land on whole
//! seconds and the top-of-minute rules line up with real minutes.

use std::time::Duration;

use chrono::{Timelike, Utc};

use crate::app::ports::ClockPort;

/// UTC system clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn sleep_until_next_second(&mut self) {
        std::thread::sleep(until_next_second(Utc::now().nanosecond()));
    }
}

/// Time left in the current second.  `nanos` may exceed one second during
/// a leap second.
fn until_next_second(nanos: u32) -> Duration {
    let into = nanos % 1_000_000_000;
    Duration::from_nanos(u64::from(1_000_000_000 - into))
}

/// Clock for simulation: every sleep advances exactly one second.
#[derive(Debug)]
pub struct SimulatedClock {
    now: i64,
}

impl SimulatedClock {
    pub fn starting_at(now: i64) -> Self {
        Self { now }
    }
}

impl ClockPort for SimulatedClock {
    fn now(&self) -> i64 {
        self.now
    }

    fn sleep_until_next_second(&mut self) {
        self.now += 1;
    }
}
