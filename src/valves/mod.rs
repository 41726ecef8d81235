//! Valve sequencing for the multiplexed pressure and CO2 sensors.
//!
//! ```text
//!            ┌──────── dwell ────────┐
//!   valve k  │ clearance │  sampling │──▶ commit mean ──▶ valve k+1
//!            └───────────────────────┘
//! ```
//!
//! One pressure transducer and one CO2 analyser are switched between sample
//! points by solenoid valves.  Each tick's reading belongs to the valve that
//! is currently energised.  Readings inside the clearance window (line still
//! purging) are tagged NaN; the rest feed the in-flight mean, which is
//! committed to that valve's series when the dwell expires.

pub mod co2;
pub mod pressure;

pub use co2::{Co2Scheduler, Co2Valve};
pub use pressure::{PressureScheduler, PressureValve};

/// A value committed to one valve's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commit<V> {
    pub valve: V,
    pub value: f64,
}

/// What a scheduler did with one tick's reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValveStep<V> {
    /// Reading after clearance tagging (NaN inside the clearance window or
    /// when no valve is energised).
    pub tagged: f64,
    pub commit: Option<Commit<V>>,
}

impl<V> ValveStep<V> {
    fn idle() -> Self {
        Self {
            tagged: f64::NAN,
            commit: None,
        }
    }
}

/// Dwell bookkeeping shared by both schedulers.
#[derive(Debug, Clone, Copy)]
struct Dwell {
    start: i64,
    sum: f64,
    valid: u32,
}

impl Dwell {
    fn begin(now: i64) -> Self {
        Self {
            start: now,
            sum: 0.0,
            valid: 0,
        }
    }

    fn elapsed(&self, now: i64) -> i64 {
        now - self.start
    }

    /// Tag `reading` against the clearance window and fold it in.
    fn accept(&mut self, now: i64, reading: f64, clearance: i64) -> f64 {
        if self.elapsed(now) < clearance || reading.is_nan() {
            return f64::NAN;
        }
        self.sum += reading;
        self.valid += 1;
        reading
    }

    fn mean(&self) -> f64 {
        if self.valid == 0 {
            f64::NAN
        } else {
            self.sum / f64::from(self.valid)
        }
    }
}
