//! Application service: the hexagonal core.
//!
//! [`LoggerService`] owns the whole system state (burners, monitor, valve
//! schedulers, record accumulator, housekeeping timer and diagnostics
//! counters) and exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │        LoggerService          │
//! ActuatorPort ◀──│ Burners · Monitor · Valves    │ ──▶ RecordStore
//!                 │ Records · Housekeeping        │
//!   radio queue ─▶└──────────────────────────────┘
//! ```
//!
//! One call to [`LoggerService::tick`] is one second of the pipeline:
//! drain radio → scan → burners → monitor → valves/outputs → records →
//! housekeeping.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use log::{debug, info, warn};

use crate::burner::{Appliance, Burner};
use crate::config::SystemConfig;
use crate::diagnostics::{DiagnosticCounters, DiagnosticsView, ExternalMetrics};
use crate::error::{Result, StorageError};
use crate::fsm::BurnerMode;
use crate::housekeeping::{Housekeeping, HousekeepingTask, MAX_TASKS};
use crate::monitor::{Monitor, MonitorState};
use crate::radio::{RadioSample, RadioStats};
use crate::record::{
    FieldSource, ParameterRegistry, RecordAccumulator, RecordKind, RecordMeta, RecordPlan, Scalar,
    SeriesId, render,
};
use crate::sensors::{AnalogInput, Converter, DigitalInput, SensorSeries, TcChannel};
use crate::valves::{Co2Scheduler, Co2Valve, PressureScheduler, PressureValve};

use super::events::AppEvent;
use super::ports::{
    ActuatorPort, DigitalOutput, EventSink, HousekeepingDelegate, RecordStore, RecordStream,
    SensorPort,
};

// ───────────────────────────────────────────────────────────────
// Tick report
// ───────────────────────────────────────────────────────────────

/// Outcome of one [`LoggerService::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub now: i64,
    /// The timestamp repeated the previous tick's and nothing ran.
    pub skipped: bool,
    pub state: MonitorState,
    /// Burner modes, indexed by [`Appliance::index`].
    pub modes: [BurnerMode; 2],
    pub plan: RecordPlan,
}

// ───────────────────────────────────────────────────────────────
// System state
// ───────────────────────────────────────────────────────────────

/// Everything the per-second pipeline mutates.
struct SystemState {
    burners: [Burner; 2],
    monitor: Monitor,
    pressure: PressureScheduler,
    co2: Co2Scheduler,
    records: RecordAccumulator,
    /// Samples per radio node since the last data record.
    radio_counts: Vec<u32>,
}

impl SystemState {
    fn new(config: &SystemConfig) -> Self {
        let wh = config.water_heater_present;
        let f = config.furnace_present;
        let nodes = config.radio.nodes.len();
        Self {
            burners: [
                Burner::new(Appliance::WaterHeater, wh, config),
                Burner::new(Appliance::Furnace, f, config),
            ],
            monitor: Monitor::new(
                config.background_co2_period_secs,
                config.background_co2_window_secs,
            ),
            pressure: PressureScheduler::new(
                PressureValve::eligible(wh, f),
                config.pressure_dwell_secs,
                config.pressure_clearance_secs,
            ),
            co2: Co2Scheduler::new(
                Co2Valve::eligible(wh, f),
                config.co2_dwell_secs,
                config.co2_clearance_secs,
                config.pump_cap_secs,
            ),
            records: RecordAccumulator::new(
                nodes,
                config.multi_scan_period_secs,
                config.record_safety_net_secs,
            ),
            radio_counts: vec![0; nodes],
        }
    }

    fn max_time_on(&self) -> i64 {
        self.burners.iter().map(Burner::time_on).max().unwrap_or(0)
    }
}

/// Energised valves, as last written to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputState {
    pressure: PressureValve,
    co2: Option<Co2Valve>,
}

struct RadioInput {
    rx: Receiver<RadioSample>,
    stats: Arc<RadioStats>,
}

/// Collects due housekeeping tasks so they run after the timer releases
/// its borrow.
#[derive(Default)]
struct DueTasks(heapless::Vec<HousekeepingTask, MAX_TASKS>);

impl HousekeepingDelegate for DueTasks {
    fn on_task_due(&mut self, task: HousekeepingTask, now: i64) {
        if self.0.push(task).is_err() {
            warn!("housekeeping: '{}' due at {} dropped, list full", task.label(), now);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// LoggerService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct LoggerService {
    config: SystemConfig,
    state: SystemState,
    data_registry: ParameterRegistry,
    diag_registry: ParameterRegistry,
    housekeeping: Housekeeping,
    diagnostics: DiagnosticCounters,
    radio: Option<RadioInput>,
    node_addresses: Vec<Option<u64>>,
    outputs: Option<OutputState>,
    last_now: Option<i64>,
}

impl LoggerService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** touch hardware or files: call [`start`](Self::start)
    /// next.
    pub fn new(config: SystemConfig) -> Self {
        let housekeeping = Housekeeping::with_periods(
            config.diagnostics_interval_secs,
            config.disk_check_interval_secs,
            config.disk_check_interval_secs,
        );
        let node_addresses = config
            .radio
            .nodes
            .iter()
            .map(crate::config::RadioNodeConfig::address_u64)
            .collect();
        Self {
            state: SystemState::new(&config),
            data_registry: ParameterRegistry::data_record(&config),
            diag_registry: ParameterRegistry::diagnostics_record(),
            housekeeping,
            diagnostics: DiagnosticCounters::new(),
            radio: None,
            node_addresses,
            outputs: None,
            last_now: None,
            config,
        }
    }

    /// Feed radio samples from a reader thread into the data record.
    pub fn attach_radio(&mut self, rx: Receiver<RadioSample>, stats: Arc<RadioStats>) {
        self.radio = Some(RadioInput { rx, stats });
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Power the valve rail, de-energise everything, energise the first
    /// pressure valve, and open both record streams.
    pub fn start(
        &mut self,
        now: i64,
        hw: &mut impl ActuatorPort,
        store: &mut impl RecordStore,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        hw.all_valves_off();
        hw.write_digital_output(DigitalOutput::Power24V, true);
        self.outputs = None;
        self.apply_outputs(hw);

        let data = self.preamble(&self.data_registry);
        store.begin_stream(RecordStream::Data, now, &data)?;
        let diag = self.preamble(&self.diag_registry);
        store.begin_stream(RecordStream::Diagnostics, now, &diag)?;

        info!(
            "LoggerService started: site={} columns={} wh={} f={}",
            self.config.site_name,
            self.data_registry.column_count(),
            self.config.water_heater_present,
            self.config.furnace_present,
        );
        sink.emit(&AppEvent::Started {
            site: self.config.site_name.clone(),
            water_heater: self.config.water_heater_present,
            furnace: self.config.furnace_present,
        });
        Ok(())
    }

    /// Drop every output and the 24 V rail, then flush the record files.
    pub fn shutdown(
        &mut self,
        hw: &mut impl ActuatorPort,
        store: &mut impl RecordStore,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        hw.all_valves_off();
        hw.write_digital_output(DigitalOutput::Power24V, false);
        self.outputs = None;
        sink.emit(&AppEvent::Stopped);
        store.flush()?;
        info!("LoggerService stopped after {} records", self.state.records.rec_num());
        Ok(())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one second of the pipeline.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.  A storage error (failed write, disk
    /// nearly full) is returned and ends the run.
    pub fn tick(
        &mut self,
        now: i64,
        hw: &mut (impl SensorPort + ActuatorPort),
        store: &mut impl RecordStore,
        sink: &mut impl EventSink,
    ) -> Result<TickReport> {
        if self.last_now == Some(now) {
            debug!("tick {} repeated, skipped", now);
            return Ok(TickReport {
                now,
                skipped: true,
                state: self.state.monitor.state(),
                modes: self.modes(),
                plan: RecordPlan::default(),
            });
        }
        if let Some(previous) = self.last_now.filter(|&p| now < p) {
            warn!("clock went backwards: {} -> {}", previous, now);
            self.diagnostics.record_clock_anomaly();
            sink.emit(&AppEvent::ClockAnomaly { previous, now });
        }
        self.last_now = Some(now);
        self.diagnostics.record_tick(now);

        // 1. Radio
        self.drain_radio(sink);

        // 2. Scan
        let (pressure, co2) = self.scan(hw);

        // 3. Burners
        for burner in &mut self.state.burners {
            let t = burner.advance(now);
            if t.changed() {
                sink.emit(&AppEvent::ModeChanged {
                    appliance: burner.appliance(),
                    from: t.from,
                    to: t.to,
                    time_on: t.time_on,
                });
            }
        }

        // 4. Monitor
        let modes = self.modes();
        let state = self.state.monitor.update(modes, now);
        let prev_state = self.state.monitor.prev_state();
        if state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: state,
            });
        }

        // 5. Valves and outputs
        self.step_valves(now, pressure, co2, sink);
        self.apply_outputs(hw);

        // 6. Records
        let plan = self.write_records(now, store, sink)?;

        // 7. Housekeeping
        self.run_housekeeping(now, store, sink)?;

        Ok(TickReport {
            now,
            skipped: false,
            state,
            modes,
            plan,
        })
    }

    // ── Queries ───────────────────────────────────────────────

    /// Render one line of the data record from the current state.  Scan
    /// kinds show the window as it stands, without consuming it.
    pub fn record_line(&self, kind: RecordKind) -> String {
        let now = self.last_now.unwrap_or(0);
        let meta = RecordMeta {
            rec_num: self.state.records.rec_num(),
            scans_accum: self.state.records.scans(),
            sec_count: self.state.records.last_record().map_or(0, |t| now - t),
        };
        self.render_data(kind, now, meta)
    }

    pub fn monitor_state(&self) -> MonitorState {
        self.state.monitor.state()
    }

    pub fn burner(&self, appliance: Appliance) -> &Burner {
        &self.state.burners[appliance.index()]
    }

    pub fn modes(&self) -> [BurnerMode; 2] {
        [self.state.burners[0].mode(), self.state.burners[1].mode()]
    }

    pub fn monitor(&self) -> &Monitor {
        &self.state.monitor
    }

    pub fn pressure(&self) -> &PressureScheduler {
        &self.state.pressure
    }

    pub fn co2(&self) -> &Co2Scheduler {
        &self.state.co2
    }

    pub fn records(&self) -> &RecordAccumulator {
        &self.state.records
    }

    pub fn diagnostics(&self) -> &DiagnosticCounters {
        &self.diagnostics
    }

    pub fn data_registry(&self) -> &ParameterRegistry {
        &self.data_registry
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal: pipeline stages ─────────────────────────────

    fn drain_radio(&mut self, sink: &mut impl EventSink) {
        let Some(radio) = &self.radio else {
            return;
        };
        let bank = self.state.records.bank_mut();
        let mut samples = 0;
        let mut unknown = 0;
        for sample in radio.rx.try_iter() {
            samples += 1;
            let Some(node) = self
                .node_addresses
                .iter()
                .position(|a| *a == Some(sample.address))
            else {
                unknown += 1;
                debug!("radio: sample from unknown node {:016X}", sample.address);
                continue;
            };
            let supply = sample
                .supply
                .map_or(f64::NAN, |c| Converter::XbeeSupply.apply(f64::from(c)));
            let ain = sample.analog[0]
                .map_or(f64::NAN, |c| Converter::XbeeAnalog.apply(f64::from(c)));
            bank.append(SeriesId::RadioSupply(node), supply);
            bank.append(SeriesId::RadioAnalog(node), ain);
            self.state.radio_counts[node] += 1;
        }
        if samples > 0 {
            sink.emit(&AppEvent::RadioDrained { samples, unknown });
        }
    }

    /// Read every input into its series.  Returns this tick's raw pressure
    /// and CO2 readings for the valve schedulers.
    fn scan(&mut self, hw: &mut impl SensorPort) -> (f64, f64) {
        let diag = &mut self.diagnostics;
        let mut checked = |value: f64| {
            if value.is_nan() {
                diag.record_nan();
            }
            value
        };
        let bank = self.state.records.bank_mut();

        let mut temps = [f64::NAN; TcChannel::COUNT as usize];
        for tc in TcChannel::all() {
            let t = checked(hw.read_temperature(tc));
            temps[tc.index()] = t;
            bank.append(SeriesId::Tc(tc), t);
        }
        for input in AnalogInput::ALL {
            let v = checked(hw.read_analog(input));
            bank.append(SeriesId::Analog(input), v);
        }
        for input in DigitalInput::ALL {
            let closed = hw.read_digital_input(input);
            bank.append(SeriesId::Switch(input), if closed { 1.0 } else { 0.0 });
        }
        let pressure = checked(hw.read_pressure());
        let co2 = checked(hw.read_co2_raw());

        for burner in &mut self.state.burners {
            burner.push_temperature(temps.get(burner.tc().index()).copied().unwrap_or(f64::NAN));
        }
        (pressure, co2)
    }

    fn step_valves(&mut self, now: i64, pressure: f64, co2: f64, sink: &mut impl EventSink) {
        let st = &mut self.state;

        if let Some(commit) = st.pressure.step(now, pressure).commit {
            st.records
                .bank_mut()
                .append(SeriesId::Pressure(commit.valve), commit.value);
        }

        let was_sampling = st.co2.active();
        let max_time_on = st.max_time_on();
        let state = st.monitor.state();
        let prev_state = st.monitor.prev_state();
        if let Some(commit) = st.co2.step(now, state, prev_state, max_time_on, co2).commit {
            st.records
                .bank_mut()
                .append(SeriesId::Co2(commit.valve), commit.value);
        }
        if was_sampling.is_some() != st.co2.pump_on() {
            sink.emit(&AppEvent::Co2Sampling(st.co2.active()));
        }
    }

    /// Write the valve and pump outputs that changed, breaking before
    /// making.
    fn apply_outputs(&mut self, hw: &mut impl ActuatorPort) {
        let next = OutputState {
            pressure: self.state.pressure.active(),
            co2: self.state.co2.active(),
        };
        let prev = self.outputs;
        if prev == Some(next) {
            return;
        }

        if let Some(prev) = prev {
            if prev.pressure != next.pressure {
                hw.write_digital_output(DigitalOutput::PressureValve(prev.pressure), false);
            }
            if prev.co2 != next.co2 {
                if let Some(valve) = prev.co2 {
                    hw.write_digital_output(DigitalOutput::Co2Valve(valve), false);
                }
            }
        }
        if prev.map(|p| p.pressure) != Some(next.pressure) {
            hw.write_digital_output(DigitalOutput::PressureValve(next.pressure), true);
        }
        if prev.map(|p| p.co2) != Some(next.co2) {
            if let Some(valve) = next.co2 {
                hw.write_digital_output(DigitalOutput::Co2Valve(valve), true);
            }
            let pump_was_on = prev.is_some_and(|p| p.co2.is_some());
            if prev.is_none() || pump_was_on != next.co2.is_some() {
                hw.write_digital_output(DigitalOutput::Pump, next.co2.is_some());
            }
        }
        self.outputs = Some(next);
    }

    fn write_records(
        &mut self,
        now: i64,
        store: &mut impl RecordStore,
        sink: &mut impl EventSink,
    ) -> Result<RecordPlan> {
        let state = self.state.monitor.state();
        let prev_state = self.state.monitor.prev_state();
        let plan = self.state.records.plan(now, state, prev_state);

        if plan.close_out {
            self.write_data_record(RecordKind::MultiScan, now, store, sink)?;
        }
        if plan.single_scan {
            self.write_data_record(RecordKind::SingleScan, now, store, sink)?;
        }
        if !plan.any() {
            self.state.records.carry_scan();
        }
        Ok(plan)
    }

    fn write_data_record(
        &mut self,
        kind: RecordKind,
        now: i64,
        store: &mut impl RecordStore,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let meta = self.state.records.begin_record(kind, now);
        let line = self.render_data(kind, now, meta);
        store.append_record_line(RecordStream::Data, &line)?;

        self.state.records.finish_record(kind, now);
        self.state.radio_counts.fill(0);
        self.diagnostics.record_written();
        sink.emit(&AppEvent::RecordWritten {
            kind,
            rec_num: meta.rec_num,
        });
        Ok(())
    }

    fn run_housekeeping(
        &mut self,
        now: i64,
        store: &mut impl RecordStore,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let mut due = DueTasks::default();
        self.housekeeping.tick(now, &mut due);

        for task in due.0 {
            match task {
                HousekeepingTask::Diagnostics => self.write_diagnostics(now, store, sink)?,
                HousekeepingTask::DiskCheck => {
                    let free_bytes = store.free_disk_bytes()?;
                    let threshold = self.config.min_free_disk_bytes;
                    if free_bytes < threshold {
                        warn!("disk nearly full: {} bytes free", free_bytes);
                        sink.emit(&AppEvent::DiskLow { free_bytes });
                        return Err(StorageError::DiskNearlyFull {
                            free_bytes,
                            threshold,
                        }
                        .into());
                    }
                }
                HousekeepingTask::Rotate => {
                    for stream in RecordStream::ALL {
                        if store.rotate_file_if_oversize(stream, now)? {
                            info!("{:?} file rotated", stream);
                        }
                    }
                }
            }
            sink.emit(&AppEvent::Housekeeping(task));
        }
        Ok(())
    }

    fn write_diagnostics(
        &mut self,
        now: i64,
        store: &mut impl RecordStore,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let mut external = ExternalMetrics {
            disk_free_bytes: store.free_disk_bytes().ok(),
            data_file_bytes: store.current_file_size(RecordStream::Data),
            ..ExternalMetrics::default()
        };
        if let Some(radio) = &self.radio {
            external.radio_rx = radio.stats.received();
            external.radio_err = radio.stats.errors();
            external.radio_drop = radio.stats.dropped();
        }
        let metrics = self.diagnostics.collect(now, external);
        let view = DiagnosticsView {
            site: &self.config.site_name,
            time: now,
            metrics: &metrics,
        };
        let line = render(&self.diag_registry, RecordKind::SingleScan, &view);
        store.append_record_line(RecordStream::Diagnostics, &line)?;
        sink.emit(&AppEvent::DiagnosticsWritten {
            diag_num: metrics.diag_num,
        });
        Ok(())
    }

    // ── Internal: rendering ───────────────────────────────────

    fn preamble(&self, registry: &ParameterRegistry) -> Vec<String> {
        let mut lines = vec![render(registry, RecordKind::Header, &EmptySource)];
        if self.config.write_units_line {
            lines.push(render(registry, RecordKind::Units, &EmptySource));
        }
        lines
    }

    fn render_data(&self, kind: RecordKind, now: i64, meta: RecordMeta) -> String {
        let view = DataView {
            site: &self.config.site_name,
            now,
            meta,
            state: &self.state,
        };
        render(&self.data_registry, kind, &view)
    }
}

// ───────────────────────────────────────────────────────────────
// Field sources
// ───────────────────────────────────────────────────────────────

/// Header and units lines need no values.
struct EmptySource;

impl FieldSource for EmptySource {
    fn site(&self) -> &str {
        ""
    }

    fn time(&self) -> i64 {
        0
    }

    fn rec_num(&self) -> u64 {
        0
    }

    fn series(&self, _id: SeriesId) -> Option<&SensorSeries> {
        None
    }

    fn scalar(&self, _id: Scalar) -> f64 {
        f64::NAN
    }
}

/// The system state as one data record sees it.
struct DataView<'a> {
    site: &'a str,
    now: i64,
    meta: RecordMeta,
    state: &'a SystemState,
}

impl FieldSource for DataView<'_> {
    fn site(&self) -> &str {
        self.site
    }

    fn time(&self) -> i64 {
        self.now
    }

    fn rec_num(&self) -> u64 {
        self.meta.rec_num
    }

    fn series(&self, id: SeriesId) -> Option<&SensorSeries> {
        self.state.records.bank().get(id)
    }

    fn scalar(&self, id: Scalar) -> f64 {
        let st = self.state;
        let wh = &st.burners[Appliance::WaterHeater.index()];
        let f = &st.burners[Appliance::Furnace.index()];
        match id {
            Scalar::LocCo2 => st.co2.active().map_or(f64::NAN, |v| f64::from(v.code())),
            Scalar::SecCo2 => st.co2.seconds_open(self.now) as f64,
            Scalar::LocP => f64::from(st.pressure.active().code()),
            Scalar::SecP => st.pressure.seconds_open(self.now) as f64,
            Scalar::WhStatus => f64::from(wh.status().code()),
            Scalar::WhMode => f64::from(wh.mode().code()),
            Scalar::FStatus => f64::from(f.status().code()),
            Scalar::FMode => f64::from(f.mode().code()),
            Scalar::SysState => f64::from(st.monitor.state().code()),
            Scalar::ScansAccum => f64::from(self.meta.scans_accum),
            Scalar::SecWhRun => f64::from(st.monitor.tally(Appliance::WaterHeater).run_secs),
            Scalar::SecFRun => f64::from(st.monitor.tally(Appliance::Furnace).run_secs),
            Scalar::SecWhCooldown => {
                f64::from(st.monitor.tally(Appliance::WaterHeater).cooldown_secs)
            }
            Scalar::SecFCooldown => f64::from(st.monitor.tally(Appliance::Furnace).cooldown_secs),
            Scalar::SecCount => self.meta.sec_count as f64,
            Scalar::RadioCount(node) => st
                .radio_counts
                .get(node)
                .map_or(f64::NAN, |&n| f64::from(n)),
            _ => f64::NAN,
        }
    }
}
