//! Burner classifier: combustion status and lifecycle mode for one appliance.
//!
//! ```text
//!   burner TC reading ──▶ 10-deep window ──▶ calc_status (hysteresis)
//!                                                │
//!                                                ▼
//!                           ModeMachine (fn-pointer table) ──▶ ModeTransition
//! ```
//!
//! The status decision compares the newest burner thermocouple reading with
//! the moving average of the last ten readings.  For each previous status the
//! "stay" test runs first, then the switch tests; otherwise the status holds.

use heapless::Deque;

use crate::config::SystemConfig;
use crate::fsm::context::{BurnerContext, BurnerStatus, CoolingLimits};
use crate::fsm::states::build_mode_table;
use crate::fsm::{BurnerMode, ModeMachine};
use crate::sensors::TcChannel;

/// Depth of the moving-average window.
pub const WINDOW_DEPTH: usize = 10;

/// The two instrumented appliances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Appliance {
    WaterHeater,
    Furnace,
}

impl Appliance {
    pub const ALL: [Self; 2] = [Self::WaterHeater, Self::Furnace];

    pub const fn label(self) -> &'static str {
        match self {
            Self::WaterHeater => "water heater",
            Self::Furnace => "furnace",
        }
    }

    /// Record-column prefix ("wh" / "f").
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::WaterHeater => "wh",
            Self::Furnace => "f",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::WaterHeater => 0,
            Self::Furnace => 1,
        }
    }
}

/// Outcome of one [`Burner::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: BurnerMode,
    pub to: BurnerMode,
    pub status: BurnerStatus,
    pub time_on: i64,
    pub time_cooling: i64,
}

impl ModeTransition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Hysteresis thresholds in °F.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub t_on: f64,
    pub t_off_deadband: f64,
    pub dt_stay_on: f64,
    pub dt_stay_off: f64,
    pub dt_on: f64,
    pub dt_off: f64,
}

impl Thresholds {
    pub fn for_appliance(appliance: Appliance, config: &SystemConfig) -> Self {
        let burner = match appliance {
            Appliance::WaterHeater => &config.water_heater,
            Appliance::Furnace => &config.furnace,
        };
        Self {
            t_on: config.t_on_threshold_f,
            t_off_deadband: config.t_off_deadband_f,
            dt_stay_on: config.dt_stay_on_f,
            dt_stay_off: config.dt_stay_off_f,
            dt_on: burner.dt_on_f,
            dt_off: burner.dt_off_f,
        }
    }
}

/// One appliance's classifier and mode machine.
pub struct Burner {
    appliance: Appliance,
    present: bool,
    tc: TcChannel,
    window: Deque<f64, WINDOW_DEPTH>,
    last: f64,
    thresholds: Thresholds,
    machine: ModeMachine,
    ctx: BurnerContext,
}

impl Burner {
    pub fn new(appliance: Appliance, present: bool, config: &SystemConfig) -> Self {
        let tc = match appliance {
            Appliance::WaterHeater => config.water_heater.tc,
            Appliance::Furnace => config.furnace.tc,
        };
        let limits = CoolingLimits {
            max_secs: config.cooling_max_secs,
            min_secs: config.cooling_min_secs,
            skew_floor_secs: config.cooling_skew_floor_secs,
        };
        let initial = if present {
            BurnerMode::Off
        } else {
            BurnerMode::NotPresent
        };
        Self {
            appliance,
            present,
            tc,
            window: Deque::new(),
            last: f64::NAN,
            thresholds: Thresholds::for_appliance(appliance, config),
            machine: ModeMachine::new(build_mode_table(), initial),
            ctx: BurnerContext::new(appliance.label(), limits),
        }
    }

    /// Feed this tick's burner thermocouple reading.  NaN is remembered as
    /// `last` but kept out of the window.
    pub fn push_temperature(&mut self, value: f64) {
        self.last = value;
        if value.is_nan() {
            return;
        }
        if self.window.is_full() {
            self.window.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = self.window.push_back(value);
    }

    /// Mean of the window, NaN while empty.
    pub fn moving_average(&self) -> f64 {
        if self.window.is_empty() {
            return f64::NAN;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    fn calc_status(&self) -> BurnerStatus {
        let prev = self.ctx.status;
        let avg = self.moving_average();
        if self.last.is_nan() || avg.is_nan() {
            return prev;
        }
        let th = &self.thresholds;
        let diff = self.last - avg;

        match prev {
            BurnerStatus::Off => {
                if diff < th.dt_stay_off {
                    BurnerStatus::Off
                } else if diff > th.dt_on || avg > th.t_on {
                    BurnerStatus::On
                } else {
                    BurnerStatus::Off
                }
            }
            BurnerStatus::On => {
                if diff > th.dt_stay_on {
                    BurnerStatus::On
                } else if diff < th.dt_off || avg < th.t_on - th.t_off_deadband {
                    BurnerStatus::Off
                } else {
                    BurnerStatus::On
                }
            }
        }
    }

    /// Recompute the status and step the mode machine once.
    pub fn advance(&mut self, now: i64) -> ModeTransition {
        self.ctx.now = now;
        if self.present {
            self.ctx.status = self.calc_status();
        }
        let from = self.machine.tick(&mut self.ctx);
        ModeTransition {
            from,
            to: self.machine.current_mode(),
            status: self.ctx.status,
            time_on: self.ctx.time_on,
            time_cooling: self.ctx.time_cooling,
        }
    }

    /// Put the burner straight into `mode`, back-dating the run or stop
    /// timestamp to `now`.  Absent burners ignore this.
    pub fn force_mode(&mut self, mode: BurnerMode, now: i64) {
        if !self.present || mode == BurnerMode::NotPresent {
            return;
        }
        self.ctx.now = now;
        match mode {
            BurnerMode::JustStarted | BurnerMode::On => {
                self.ctx.status = BurnerStatus::On;
                self.ctx.start_time = now - 1;
            }
            BurnerMode::JustStopped | BurnerMode::Cooling => {
                self.ctx.status = BurnerStatus::Off;
                self.ctx.stop_time = now;
            }
            BurnerMode::Off | BurnerMode::NotPresent => {
                self.ctx.status = BurnerStatus::Off;
            }
        }
        self.machine.force(mode, &mut self.ctx);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn appliance(&self) -> Appliance {
        self.appliance
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn tc(&self) -> TcChannel {
        self.tc
    }

    pub fn mode(&self) -> BurnerMode {
        self.machine.current_mode()
    }

    pub fn status(&self) -> BurnerStatus {
        self.ctx.status
    }

    pub fn time_on(&self) -> i64 {
        self.ctx.time_on
    }

    pub fn time_cooling(&self) -> i64 {
        self.ctx.time_cooling
    }

    pub fn last(&self) -> f64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burner() -> Burner {
        Burner::new(Appliance::WaterHeater, true, &SystemConfig::default())
    }

    #[test]
    fn absent_burner_is_pinned() {
        let mut b = Burner::new(Appliance::Furnace, false, &SystemConfig::default());
        for now in 1_000..1_020 {
            b.push_temperature(400.0 + (now - 1_000) as f64 * 20.0);
            let t = b.advance(now);
            assert_eq!(t.to, BurnerMode::NotPresent);
            assert_eq!(t.time_on, 0);
            assert_eq!(t.time_cooling, 0);
        }
        b.force_mode(BurnerMode::On, 2_000);
        assert_eq!(b.mode(), BurnerMode::NotPresent);
    }

    #[test]
    fn window_drops_oldest_and_skips_nan() {
        let mut b = burner();
        for i in 0..12 {
            b.push_temperature(f64::from(i));
        }
        b.push_temperature(f64::NAN);
        // Window holds 2..=11.
        assert!((b.moving_average() - 6.5).abs() < 1e-12);
        assert!(b.last().is_nan());
    }

    #[test]
    fn nan_reading_holds_status() {
        let mut b = burner();
        b.force_mode(BurnerMode::On, 100);
        b.push_temperature(f64::NAN);
        let t = b.advance(101);
        assert_eq!(t.status, BurnerStatus::On);
    }

    #[test]
    fn ramp_switches_on_at_first_large_rise() {
        let mut b = burner();
        let mut now = 10_000;
        for _ in 0..20 {
            b.push_temperature(80.0);
            b.advance(now);
            now += 1;
        }
        assert_eq!(b.status(), BurnerStatus::Off);

        // 2 °F per tick: last-avg grows each tick while the window fills,
        // so the first crossing of dtOn decides the switch.
        let mut temp = 80.0;
        let mut switched_at = None;
        while temp < 300.0 {
            temp += 2.0;
            b.push_temperature(temp);
            let diff = temp - b.moving_average();
            let t = b.advance(now);
            if t.status == BurnerStatus::On {
                assert!(diff > 5.0);
                switched_at = Some(now);
                break;
            }
            assert!(diff <= 5.0, "stayed off with diff {diff}");
            now += 1;
        }
        assert!(switched_at.is_some());
        assert_eq!(b.mode(), BurnerMode::JustStarted);
    }

    #[test]
    fn run_cycle_walks_every_mode() {
        let mut b = burner();
        let mut now = 20_000;
        let feed = |b: &mut Burner, t: f64, now: &mut i64| {
            b.push_temperature(t);
            let tr = b.advance(*now);
            *now += 1;
            tr
        };
        for _ in 0..10 {
            feed(&mut b, 80.0, &mut now);
        }
        assert_eq!(feed(&mut b, 240.0, &mut now).to, BurnerMode::JustStarted);
        assert_eq!(feed(&mut b, 240.0, &mut now).to, BurnerMode::On);
        for _ in 0..30 {
            assert_eq!(feed(&mut b, 240.0, &mut now).to, BurnerMode::On);
        }
        assert_eq!(b.time_on(), 32);

        let stopped = feed(&mut b, 150.0, &mut now);
        assert_eq!(stopped.to, BurnerMode::JustStopped);
        assert_eq!(stopped.time_on, 33);
        let cooling = feed(&mut b, 140.0, &mut now);
        assert_eq!(cooling.to, BurnerMode::Cooling);
        assert_eq!(cooling.time_on, 0);

        let mut ticks = 0;
        while b.mode() == BurnerMode::Cooling {
            feed(&mut b, 80.0, &mut now);
            ticks += 1;
            assert!(ticks <= 200);
        }
        assert_eq!(b.mode(), BurnerMode::Off);
        assert_eq!(b.time_cooling(), 0);
    }

    #[test]
    fn high_average_alone_turns_on() {
        let mut b = burner();
        let mut now = 0;
        // Slow climb never beats dtOn but lifts the average past 250.
        let mut temp = 240.0;
        for _ in 0..40 {
            temp += 0.5;
            b.push_temperature(temp);
            b.advance(now);
            now += 1;
        }
        assert_eq!(b.status(), BurnerStatus::On);
    }

    #[test]
    fn transition_reports_change() {
        let mut b = burner();
        b.push_temperature(80.0);
        let t = b.advance(5);
        assert!(!t.changed());
        b.push_temperature(200.0);
        let t = b.advance(6);
        assert!(t.changed());
        assert_eq!(t.from, BurnerMode::Off);
        assert_eq!(t.to, BurnerMode::JustStarted);
    }
}
