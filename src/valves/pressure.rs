//! Round-robin pressure valve schedule with zero-offset correction.
//!
//! The Zero valve vents both transducer ports to the same reference, so its
//! mean is the sensor's current offset.  Every other valve commits its mean
//! minus the most recent zero.

use log::debug;

use super::{Commit, Dwell, ValveStep};

/// Pressure sample points.  Discriminants are the `loc_p` record codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PressureValve {
    Zero = 0,
    WhVent = 1,
    FVent = 2,
    Zone = 3,
}

impl PressureValve {
    pub const ALL: [Self; 4] = [Self::Zero, Self::WhVent, Self::FVent, Self::Zone];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::WhVent => "whvent",
            Self::FVent => "fvent",
            Self::Zone => "zone",
        }
    }

    /// Eligible valves, dropping the vent of an absent appliance.
    pub fn eligible(water_heater_present: bool, furnace_present: bool) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|v| match v {
                Self::WhVent => water_heater_present,
                Self::FVent => furnace_present,
                Self::Zero | Self::Zone => true,
            })
            .collect()
    }
}

pub struct PressureScheduler {
    valves: Vec<PressureValve>,
    cursor: usize,
    dwell: Option<Dwell>,
    dwell_secs: i64,
    clearance_secs: i64,
    zero_offset: f64,
}

impl PressureScheduler {
    pub fn new(valves: Vec<PressureValve>, dwell_secs: u32, clearance_secs: u32) -> Self {
        debug_assert!(!valves.is_empty());
        Self {
            valves,
            cursor: 0,
            dwell: None,
            dwell_secs: i64::from(dwell_secs),
            clearance_secs: i64::from(clearance_secs),
            zero_offset: 0.0,
        }
    }

    /// Credit `reading` (Pa, NaN if failed) to the energised valve and
    /// rotate once the dwell has run out.
    pub fn step(&mut self, now: i64, reading: f64) -> ValveStep<PressureValve> {
        let Some(&valve) = self.valves.get(self.cursor) else {
            return ValveStep::idle();
        };
        let dwell = self.dwell.get_or_insert_with(|| Dwell::begin(now));
        let tagged = dwell.accept(now, reading, self.clearance_secs);

        if dwell.elapsed(now) < self.dwell_secs {
            return ValveStep {
                tagged,
                commit: None,
            };
        }

        let mean = dwell.mean();
        let value = if valve == PressureValve::Zero {
            if !mean.is_nan() {
                self.zero_offset = mean;
            }
            mean
        } else {
            mean - self.zero_offset
        };

        self.cursor = (self.cursor + 1) % self.valves.len();
        self.dwell = Some(Dwell::begin(now));
        debug!(
            "pressure: {} = {:.2} Pa, next {}",
            valve.name(),
            value,
            self.valves[self.cursor].name()
        );

        ValveStep {
            tagged,
            commit: Some(Commit { valve, value }),
        }
    }

    /// Valve to energise after this tick.
    pub fn active(&self) -> PressureValve {
        self.valves[self.cursor]
    }

    /// Seconds the active valve has been open.
    pub fn seconds_open(&self, now: i64) -> i64 {
        self.dwell.map_or(0, |d| d.elapsed(now))
    }

    pub fn zero_offset(&self) -> f64 {
        self.zero_offset
    }

    pub fn valves(&self) -> &[PressureValve] {
        &self.valves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(wh: bool, f: bool) -> PressureScheduler {
        PressureScheduler::new(PressureValve::eligible(wh, f), 3, 2)
    }

    #[test]
    fn absent_appliance_vents_are_pruned() {
        assert_eq!(
            PressureValve::eligible(true, false),
            vec![PressureValve::Zero, PressureValve::WhVent, PressureValve::Zone]
        );
        assert_eq!(PressureValve::eligible(true, true).len(), 4);
    }

    #[test]
    fn clearance_readings_are_nan() {
        let mut s = scheduler(true, true);
        assert!(s.step(0, 1.0).tagged.is_nan());
        assert!(s.step(1, 1.0).tagged.is_nan());
        assert_eq!(s.step(2, 1.0).tagged, 1.0);
    }

    #[test]
    fn zero_commit_sets_offset_and_others_subtract_it() {
        let mut s = scheduler(true, true);
        // Zero valve: readings at t=2,3 count.
        for (t, p) in [(0, 9.0), (1, 9.0), (2, 0.4), (3, 0.6)] {
            let step = s.step(t, p);
            if t == 3 {
                let c = step.commit.unwrap();
                assert_eq!(c.valve, PressureValve::Zero);
                assert!((c.value - 0.5).abs() < 1e-12);
            }
        }
        assert!((s.zero_offset() - 0.5).abs() < 1e-12);
        assert_eq!(s.active(), PressureValve::WhVent);

        // WhVent opened at t=3: t=5,6 count.
        s.step(4, 100.0);
        s.step(5, -2.5);
        let c = s.step(6, -3.5).commit.unwrap();
        assert_eq!(c.valve, PressureValve::WhVent);
        assert!((c.value - (-3.5)).abs() < 1e-12);
    }

    #[test]
    fn nan_only_dwell_commits_nan_and_keeps_offset() {
        let mut s = scheduler(false, false);
        for t in 0..3 {
            s.step(t, f64::NAN);
        }
        let c = s.step(3, f64::NAN).commit.unwrap();
        assert_eq!(c.valve, PressureValve::Zero);
        assert!(c.value.is_nan());
        assert_eq!(s.zero_offset(), 0.0);
    }

    #[test]
    fn seconds_open_tracks_dwell() {
        let mut s = scheduler(true, true);
        assert_eq!(s.seconds_open(10), 0);
        s.step(10, 1.0);
        assert_eq!(s.seconds_open(12), 2);
    }
}
