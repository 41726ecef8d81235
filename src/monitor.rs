//! System-wide monitoring state derived from both burners' modes.
//!
//! ```text
//!   WH mode ─┐
//!            ├──▶ priority rules ──▶ OffCO2 window ──▶ MonitorState
//!   F mode  ─┘
//! ```
//!
//! The first matching rule wins: On, Start, Stop, CoolDown, Off.  An Off
//! system inside the background-CO2 window of each period reports OffCO2
//! so the CO2 schedule can take an ambient sample.

use crate::burner::Appliance;
use crate::fsm::BurnerMode;

/// Monitoring state.  Discriminants are the record codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MonitorState {
    Start = 1,
    On = 2,
    Stop = 3,
    CoolDown = 4,
    OffCO2 = 5,
    Off = 6,
}

impl MonitorState {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// States that record once per second.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Start | Self::On | Self::Stop | Self::CoolDown)
    }

    /// States that accumulate multi-scan records.
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Off | Self::OffCO2)
    }
}

/// Per-burner run and cooldown accumulators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BurnerTally {
    pub run_secs: u32,
    pub cooldown_secs: u32,
}

impl BurnerTally {
    fn update(&mut self, mode: BurnerMode) {
        match mode {
            BurnerMode::On | BurnerMode::JustStarted => self.run_secs += 1,
            BurnerMode::Cooling => self.cooldown_secs += 1,
            BurnerMode::Off => *self = Self::default(),
            BurnerMode::JustStopped | BurnerMode::NotPresent => {}
        }
    }
}

pub struct Monitor {
    state: MonitorState,
    prev_state: MonitorState,
    tallies: [BurnerTally; 2],
    background_period_secs: i64,
    background_window_secs: i64,
}

impl Monitor {
    pub fn new(background_period_secs: u32, background_window_secs: u32) -> Self {
        Self {
            state: MonitorState::Off,
            prev_state: MonitorState::Off,
            tallies: [BurnerTally::default(); 2],
            background_period_secs: i64::from(background_period_secs),
            background_window_secs: i64::from(background_window_secs),
        }
    }

    /// Derive this tick's state from the burners' current modes, indexed by
    /// [`Appliance::index`].
    pub fn update(&mut self, modes: [BurnerMode; 2], now: i64) -> MonitorState {
        for (tally, mode) in self.tallies.iter_mut().zip(modes) {
            tally.update(mode);
        }

        let any = |m: BurnerMode| modes.contains(&m);
        let mut next = if any(BurnerMode::On) {
            MonitorState::On
        } else if any(BurnerMode::JustStarted) {
            MonitorState::Start
        } else if any(BurnerMode::JustStopped) {
            MonitorState::Stop
        } else if any(BurnerMode::Cooling) {
            MonitorState::CoolDown
        } else {
            // Any burner Off, or nothing instrumented.
            MonitorState::Off
        };

        if next == MonitorState::Off && self.in_background_window(now) {
            next = MonitorState::OffCO2;
        }

        self.prev_state = self.state;
        self.state = next;
        next
    }

    fn in_background_window(&self, now: i64) -> bool {
        self.background_period_secs > 0
            && now.rem_euclid(self.background_period_secs) < self.background_window_secs
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Final state of the previous tick.
    pub fn prev_state(&self) -> MonitorState {
        self.prev_state
    }

    pub fn tally(&self, appliance: Appliance) -> BurnerTally {
        self.tallies[appliance.index()]
    }
}
