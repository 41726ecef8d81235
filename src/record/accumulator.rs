//! Scan accumulation and the per-second record decision.
//!
//! Idle states (Off, OffCO2) accumulate scans and write one multi-scan
//! record per minute; active states write a single-scan record every second.
//! Each tick, in order:
//!
//! 1. close out the accumulation window if the previous state was idle and
//!    this is the top of a minute, if the safety-net interval has passed, or
//!    if the system just left idle;
//! 2. write a single-scan record if the current state is active.
//!
//! Both can happen in the same tick.  Series read on every scan report
//! exclusive statistics at close-out, so the current scan is left behind to
//! seed the next window.  Series fed by valve commits or radio arrivals are
//! sparse: they report every value they hold and start the next window empty.

use log::debug;

use crate::monitor::MonitorState;
use crate::sensors::{AnalogInput, DigitalInput, SensorSeries, TcChannel};
use crate::valves::{Co2Valve, PressureValve};

use super::RecordKind;

/// Identity of one sampled series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesId {
    Tc(TcChannel),
    Analog(AnalogInput),
    Switch(DigitalInput),
    Co2(Co2Valve),
    Pressure(PressureValve),
    /// Supply voltage of radio node `n`.
    RadioSupply(usize),
    /// First analog input of radio node `n`.
    RadioAnalog(usize),
}

impl SeriesId {
    /// Appended once per tick, as opposed to on a valve commit or a radio
    /// arrival.
    pub const fn is_per_scan(self) -> bool {
        matches!(self, Self::Tc(_) | Self::Analog(_) | Self::Switch(_))
    }
}

/// Every series the data record reports.
#[derive(Debug, Clone)]
pub struct SeriesBank {
    tcs: [SensorSeries; TcChannel::COUNT as usize],
    analog: [SensorSeries; AnalogInput::ALL.len()],
    switches: [SensorSeries; DigitalInput::ALL.len()],
    co2: [SensorSeries; Co2Valve::ALL.len()],
    pressure: [SensorSeries; PressureValve::ALL.len()],
    radio: Vec<[SensorSeries; 2]>,
}

impl SeriesBank {
    pub fn new(radio_nodes: usize) -> Self {
        Self {
            tcs: std::array::from_fn(|_| SensorSeries::new()),
            analog: std::array::from_fn(|_| SensorSeries::new()),
            switches: std::array::from_fn(|_| SensorSeries::new()),
            co2: std::array::from_fn(|_| SensorSeries::new()),
            pressure: std::array::from_fn(|_| SensorSeries::new()),
            radio: (0..radio_nodes)
                .map(|_| [SensorSeries::new(), SensorSeries::new()])
                .collect(),
        }
    }

    pub fn get(&self, id: SeriesId) -> Option<&SensorSeries> {
        match id {
            SeriesId::Tc(tc) => self.tcs.get(tc.index()),
            SeriesId::Analog(a) => Some(&self.analog[analog_index(a)]),
            SeriesId::Switch(d) => Some(&self.switches[switch_index(d)]),
            SeriesId::Co2(v) => Some(&self.co2[usize::from(v.code())]),
            SeriesId::Pressure(v) => Some(&self.pressure[usize::from(v.code())]),
            SeriesId::RadioSupply(n) => self.radio.get(n).map(|s| &s[0]),
            SeriesId::RadioAnalog(n) => self.radio.get(n).map(|s| &s[1]),
        }
    }

    pub fn get_mut(&mut self, id: SeriesId) -> Option<&mut SensorSeries> {
        match id {
            SeriesId::Tc(tc) => self.tcs.get_mut(tc.index()),
            SeriesId::Analog(a) => Some(&mut self.analog[analog_index(a)]),
            SeriesId::Switch(d) => Some(&mut self.switches[switch_index(d)]),
            SeriesId::Co2(v) => Some(&mut self.co2[usize::from(v.code())]),
            SeriesId::Pressure(v) => Some(&mut self.pressure[usize::from(v.code())]),
            SeriesId::RadioSupply(n) => self.radio.get_mut(n).map(|s| &mut s[0]),
            SeriesId::RadioAnalog(n) => self.radio.get_mut(n).map(|s| &mut s[1]),
        }
    }

    /// Append to a series; unknown ids are ignored.
    pub fn append(&mut self, id: SeriesId, value: f64) {
        if let Some(series) = self.get_mut(id) {
            series.append(value);
        }
    }

    fn per_scan_mut(&mut self) -> impl Iterator<Item = &mut SensorSeries> {
        self.tcs
            .iter_mut()
            .chain(self.analog.iter_mut())
            .chain(self.switches.iter_mut())
    }

    fn sparse_mut(&mut self) -> impl Iterator<Item = &mut SensorSeries> {
        self.co2
            .iter_mut()
            .chain(self.pressure.iter_mut())
            .chain(self.radio.iter_mut().flatten())
    }

    pub fn clear(&mut self) {
        self.per_scan_mut().for_each(SensorSeries::clear);
        self.sparse_mut().for_each(SensorSeries::clear);
    }

    /// Start the next accumulation window: per-scan series keep their last
    /// sample, sparse series are emptied.
    pub fn seed_next_window(&mut self) {
        self.per_scan_mut().for_each(SensorSeries::clear_except_last);
        self.sparse_mut().for_each(SensorSeries::clear);
    }
}

fn analog_index(input: AnalogInput) -> usize {
    match input {
        AnalogInput::Door1 => 0,
        AnalogInput::Fan1 => 1,
        AnalogInput::Fan2 => 2,
        AnalogInput::Co => 3,
    }
}

fn switch_index(input: DigitalInput) -> usize {
    match input {
        DigitalInput::Switch1 => 0,
        DigitalInput::Switch2 => 1,
    }
}

/// Which records this tick writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordPlan {
    pub close_out: bool,
    pub single_scan: bool,
}

impl RecordPlan {
    pub fn any(&self) -> bool {
        self.close_out || self.single_scan
    }
}

/// Bookkeeping columns of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMeta {
    pub rec_num: u64,
    pub scans_accum: u32,
    pub sec_count: i64,
}

pub struct RecordAccumulator {
    bank: SeriesBank,
    multi_scan_period: i64,
    safety_net: i64,
    /// Scans in the current window before this tick.
    scans: u32,
    last_record: Option<i64>,
    rec_num: u64,
}

impl RecordAccumulator {
    pub fn new(radio_nodes: usize, multi_scan_period: i64, safety_net: i64) -> Self {
        Self {
            bank: SeriesBank::new(radio_nodes),
            multi_scan_period,
            safety_net,
            scans: 0,
            last_record: None,
            rec_num: 0,
        }
    }

    pub fn bank(&self) -> &SeriesBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut SeriesBank {
        &mut self.bank
    }

    /// Decide this tick's records.  Call after the tick's scan has been
    /// appended.
    pub fn plan(&mut self, now: i64, state: MonitorState, prev_state: MonitorState) -> RecordPlan {
        let last_record = *self.last_record.get_or_insert(now);

        let top_of_period = self.multi_scan_period > 0 && now.rem_euclid(self.multi_scan_period) == 0;
        let close_out = (prev_state.is_idle() && top_of_period)
            || now - last_record >= self.safety_net
            || (prev_state.is_idle() && state.is_active());

        RecordPlan {
            close_out,
            single_scan: state.is_active(),
        }
    }

    /// Columns for the record about to be written.  Bumps the sequence
    /// number.
    pub fn begin_record(&mut self, kind: RecordKind, now: i64) -> RecordMeta {
        self.rec_num += 1;
        let scans_accum = match kind {
            RecordKind::MultiScan => self.scans,
            _ => 1,
        };
        RecordMeta {
            rec_num: self.rec_num,
            scans_accum,
            sec_count: now - self.last_record.unwrap_or(now),
        }
    }

    /// Reset the window after a record was written.
    pub fn finish_record(&mut self, kind: RecordKind, now: i64) {
        match kind {
            RecordKind::MultiScan => {
                self.bank.seed_next_window();
                self.scans = 1;
            }
            _ => {
                self.bank.clear();
                self.scans = 0;
            }
        }
        self.last_record = Some(now);
        debug!("record {} ({:?}) written", self.rec_num, kind);
    }

    /// The tick's scan stays in the window.
    pub fn carry_scan(&mut self) {
        self.scans += 1;
    }

    pub fn rec_num(&self) -> u64 {
        self.rec_num
    }

    pub fn scans(&self) -> u32 {
        self.scans
    }

    pub fn last_record(&self) -> Option<i64> {
        self.last_record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MonitorState::{CoolDown, Off, OffCO2, On, Start};

    // Minute-aligned, outside any background window.
    const T0: i64 = 1_700_003_640;

    fn acc() -> RecordAccumulator {
        RecordAccumulator::new(0, 60, 120)
    }

    #[test]
    fn idle_closes_out_at_top_of_minute() {
        let mut a = acc();
        assert_eq!(T0 % 60, 0);
        // First tick seeds last_record; top of minute closes an empty window.
        let plan = a.plan(T0 + 1, Off, Off);
        assert!(!plan.any());
        a.carry_scan();
        for now in T0 + 2..T0 + 60 {
            assert!(!a.plan(now, Off, Off).any());
            a.carry_scan();
        }
        let plan = a.plan(T0 + 60, Off, Off);
        assert_eq!(plan, RecordPlan { close_out: true, single_scan: false });
        let meta = a.begin_record(RecordKind::MultiScan, T0 + 60);
        assert_eq!(meta.scans_accum, 59);
        assert_eq!(meta.sec_count, 59);
        assert_eq!(meta.rec_num, 1);
        a.finish_record(RecordKind::MultiScan, T0 + 60);
        assert_eq!(a.scans(), 1);
    }

    #[test]
    fn safety_net_closes_out_after_skipped_ticks() {
        let mut a = acc();
        a.plan(T0 + 1, Off, Off);
        let plan = a.plan(T0 + 130, Off, Off);
        assert!(plan.close_out);
        assert!(!plan.single_scan);
        assert!(a.plan(T0 + 131, CoolDown, CoolDown).single_scan);
    }

    #[test]
    fn leaving_idle_writes_both_records() {
        let mut a = acc();
        a.plan(T0 + 1, OffCO2, Off);
        a.carry_scan();
        a.plan(T0 + 2, Off, OffCO2);
        a.carry_scan();
        let plan = a.plan(T0 + 3, Start, Off);
        assert_eq!(plan, RecordPlan { close_out: true, single_scan: true });

        a.bank_mut().append(SeriesId::Tc(TcChannel(0)), 80.0);
        let multi = a.begin_record(RecordKind::MultiScan, T0 + 3);
        a.finish_record(RecordKind::MultiScan, T0 + 3);
        let single = a.begin_record(RecordKind::SingleScan, T0 + 3);
        a.finish_record(RecordKind::SingleScan, T0 + 3);
        assert_eq!(multi.rec_num + 1, single.rec_num);
        assert_eq!(multi.scans_accum, 2);
        assert_eq!(single.sec_count, 0);
        assert_eq!(a.scans(), 0);
        assert!(a.bank().get(SeriesId::Tc(TcChannel(0))).unwrap().is_empty());
    }

    #[test]
    fn active_to_active_writes_only_single_scans() {
        let mut a = acc();
        a.plan(T0 + 1, On, Start);
        for now in T0 + 2..T0 + 100 {
            let plan = a.plan(now, On, On);
            assert_eq!(plan, RecordPlan { close_out: false, single_scan: true });
            a.begin_record(RecordKind::SingleScan, now);
            a.finish_record(RecordKind::SingleScan, now);
        }
    }

    #[test]
    fn next_window_keeps_only_the_last_scan() {
        let mut bank = SeriesBank::new(1);
        for v in [1.0, 2.0, 3.0] {
            bank.append(SeriesId::Tc(TcChannel(4)), v);
            bank.append(SeriesId::Pressure(PressureValve::Zone), v);
            bank.append(SeriesId::Co2(Co2Valve::WhVent), v);
            bank.append(SeriesId::RadioSupply(0), v);
        }
        bank.append(SeriesId::RadioAnalog(7), 1.0);
        bank.seed_next_window();

        let tc = bank.get(SeriesId::Tc(TcChannel(4))).unwrap();
        assert_eq!(tc.count(), 1);
        assert_eq!(tc.last(), 3.0);
        assert!(bank.get(SeriesId::Pressure(PressureValve::Zone)).unwrap().is_empty());
        assert!(bank.get(SeriesId::Co2(Co2Valve::WhVent)).unwrap().is_empty());
        assert!(bank.get(SeriesId::RadioSupply(0)).unwrap().is_empty());
        assert!(bank.get(SeriesId::RadioAnalog(7)).is_none());
    }

    #[test]
    fn only_scanned_series_seed_the_next_window() {
        assert!(SeriesId::Tc(TcChannel(0)).is_per_scan());
        assert!(SeriesId::Analog(AnalogInput::Co).is_per_scan());
        assert!(SeriesId::Switch(DigitalInput::Switch2).is_per_scan());
        assert!(!SeriesId::Co2(Co2Valve::Zone).is_per_scan());
        assert!(!SeriesId::Pressure(PressureValve::Zero).is_per_scan());
        assert!(!SeriesId::RadioAnalog(0).is_per_scan());
    }
}
