//! CO2 valve schedule.
//!
//! Unlike the pressure schedule the CO2 pump and valves only run for part of
//! the time: the schedule wakes on the edge into Start (a burner just lit) or
//! into OffCO2 (the periodic ambient sample) and is forced back to sleep in
//! CoolDown and Off, or once any burner has run longer than the pump cap.
//! A Start edge while the background sample is still running restarts the
//! rotation at the first valve.

use log::{debug, info};

use super::{Commit, Dwell, ValveStep};
use crate::monitor::MonitorState;

/// CO2 sample points.  Discriminants are the `loc_co2` record codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Co2Valve {
    WhVent = 0,
    FVent = 1,
    Zone = 2,
}

impl Co2Valve {
    pub const ALL: [Self; 3] = [Self::WhVent, Self::FVent, Self::Zone];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::WhVent => "whvent",
            Self::FVent => "fvent",
            Self::Zone => "zone",
        }
    }

    pub fn eligible(water_heater_present: bool, furnace_present: bool) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|v| match v {
                Self::WhVent => water_heater_present,
                Self::FVent => furnace_present,
                Self::Zone => true,
            })
            .collect()
    }
}

pub struct Co2Scheduler {
    valves: Vec<Co2Valve>,
    /// Index into `valves`; `None` while the pump is off.
    active: Option<usize>,
    dwell: Dwell,
    dwell_secs: i64,
    clearance_secs: i64,
    pump_cap_secs: i64,
    activations: u32,
}

impl Co2Scheduler {
    pub fn new(valves: Vec<Co2Valve>, dwell_secs: u32, clearance_secs: u32, pump_cap_secs: u32) -> Self {
        Self {
            valves,
            active: None,
            dwell: Dwell::begin(0),
            dwell_secs: i64::from(dwell_secs),
            clearance_secs: i64::from(clearance_secs),
            pump_cap_secs: i64::from(pump_cap_secs),
            activations: 0,
        }
    }

    /// Advance one tick.
    ///
    /// `max_time_on` is the longest current run of either burner; the
    /// `reading` is the CO2 analyser value taken this tick, credited to the
    /// valve that was open while it was taken.
    pub fn step(
        &mut self,
        now: i64,
        state: MonitorState,
        prev_state: MonitorState,
        max_time_on: i64,
        reading: f64,
    ) -> ValveStep<Co2Valve> {
        let capped = max_time_on > self.pump_cap_secs;
        let forced_off = matches!(state, MonitorState::CoolDown | MonitorState::Off) || capped;
        let start_edge = state == MonitorState::Start && prev_state != MonitorState::Start;

        let Some(idx) = self.active else {
            let edge = start_edge
                || (state == MonitorState::OffCO2 && prev_state != MonitorState::OffCO2);
            if edge && !forced_off && !self.valves.is_empty() {
                self.active = Some(0);
                self.dwell = Dwell::begin(now);
                self.activations += 1;
                info!("co2: sampling started on {:?} edge", state);
            }
            return ValveStep::idle();
        };

        let valve = self.valves[idx];
        let tagged = self.dwell.accept(now, reading, self.clearance_secs);

        if forced_off {
            self.active = None;
            if capped {
                info!("co2: pump cap of {}s reached, sampling stopped", self.pump_cap_secs);
            } else {
                debug!("co2: sampling stopped in {:?}", state);
            }
            return ValveStep {
                tagged,
                commit: Some(Commit {
                    valve,
                    value: self.dwell.mean(),
                }),
            };
        }

        if start_edge {
            let value = self.dwell.mean();
            self.active = Some(0);
            self.dwell = Dwell::begin(now);
            info!(
                "co2: burner started, {} = {:.0} ppm, restarting at {}",
                valve.name(),
                value,
                self.valves[0].name()
            );
            return ValveStep {
                tagged,
                commit: Some(Commit { valve, value }),
            };
        }

        if self.dwell.elapsed(now) < self.dwell_secs {
            return ValveStep {
                tagged,
                commit: None,
            };
        }

        let value = self.dwell.mean();
        let next = (idx + 1) % self.valves.len();
        self.active = Some(next);
        self.dwell = Dwell::begin(now);
        debug!(
            "co2: {} = {:.0} ppm, next {}",
            valve.name(),
            value,
            self.valves[next].name()
        );
        ValveStep {
            tagged,
            commit: Some(Commit { valve, value }),
        }
    }

    /// Valve to energise after this tick, if any.
    pub fn active(&self) -> Option<Co2Valve> {
        self.active.map(|i| self.valves[i])
    }

    /// The pump runs exactly when a valve is open.
    pub fn pump_on(&self) -> bool {
        self.active.is_some()
    }

    pub fn seconds_open(&self, now: i64) -> i64 {
        if self.active.is_some() {
            self.dwell.elapsed(now)
        } else {
            0
        }
    }

    /// Times the schedule has woken since start-up.
    pub fn activations(&self) -> u32 {
        self.activations
    }
}
