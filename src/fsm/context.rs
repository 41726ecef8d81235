//! Shared mutable context threaded through every mode handler.
//!
//! `BurnerContext` is the blackboard the handlers read from and write to:
//! the status computed this tick, the tick timestamp, and the start/stop
//! timestamps from which the on and cooling timers are derived.  All times
//! are UTC epoch seconds.

/// Combustion status derived from temperature hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BurnerStatus {
    #[default]
    Off,
    On,
}

impl BurnerStatus {
    /// Record code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }
}

/// When a cooling burner is declared Off.
#[derive(Debug, Clone, Copy)]
pub struct CoolingLimits {
    /// Always Off after this long.
    pub max_secs: i64,
    /// Off at the top of a minute after this long.
    pub min_secs: i64,
    /// Cooling time at or below this means the clock went backwards.
    pub skew_floor_secs: i64,
}

impl Default for CoolingLimits {
    fn default() -> Self {
        Self {
            max_secs: 180,
            min_secs: 120,
            skew_floor_secs: -10,
        }
    }
}

/// The context passed to every mode handler.
#[derive(Debug, Clone)]
pub struct BurnerContext {
    /// Log prefix, e.g. "water heater".
    pub label: &'static str,
    /// Tick timestamp.
    pub now: i64,
    /// Status computed for this tick.
    pub status: BurnerStatus,
    /// When the current run began (back-dated one second).
    pub start_time: i64,
    /// When the last run ended.
    pub stop_time: i64,
    /// Seconds since `start_time`; zero once cooling begins.
    pub time_on: i64,
    /// Seconds since `stop_time` while cooling, else zero.
    pub time_cooling: i64,
    pub limits: CoolingLimits,
}

impl BurnerContext {
    pub fn new(label: &'static str, limits: CoolingLimits) -> Self {
        Self {
            label,
            now: 0,
            status: BurnerStatus::Off,
            start_time: 0,
            stop_time: 0,
            time_on: 0,
            time_cooling: 0,
            limits,
        }
    }

    pub fn is_on(&self) -> bool {
        self.status == BurnerStatus::On
    }

    /// Wall-clock second is the top of a minute.
    pub fn at_top_of_minute(&self) -> bool {
        self.now.rem_euclid(60) == 0
    }
}
