//! End-to-end tests of `LoggerService` against the mock adapters.

use std::sync::Arc;

use combustion_logger::app::events::AppEvent;
use combustion_logger::app::ports::{DigitalOutput, RecordStream};
use combustion_logger::app::service::{LoggerService, TickReport};
use combustion_logger::burner::Appliance;
use combustion_logger::config::{RadioNodeConfig, SystemConfig};
use combustion_logger::error::{Error, StorageError};
use combustion_logger::fsm::BurnerMode;
use combustion_logger::monitor::MonitorState;
use combustion_logger::radio::{RadioSample, RadioStats, sample_queue};
use combustion_logger::record::{RecordKind, RecordPlan};
use combustion_logger::valves::{Co2Valve, PressureValve};

use crate::mock_hw::{MemoryStore, MockHardware, RecordingSink};

/// Minute-aligned and well before the next background CO2 window.
const T0: i64 = 1_700_003_640;

struct Rig {
    svc: LoggerService,
    hw: MockHardware,
    store: MemoryStore,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: SystemConfig) -> Self {
        Self::starting_at(config, T0)
    }

    fn starting_at(config: SystemConfig, start: i64) -> Self {
        let mut rig = Self {
            svc: LoggerService::new(config),
            hw: MockHardware::new(80.0),
            store: MemoryStore::new(),
            sink: RecordingSink::default(),
        };
        rig.svc
            .start(start, &mut rig.hw, &mut rig.store, &mut rig.sink)
            .unwrap();
        rig
    }

    fn tick(&mut self, now: i64) -> TickReport {
        self.svc
            .tick(now, &mut self.hw, &mut self.store, &mut self.sink)
            .unwrap()
    }

    fn records_of(&self, kind: RecordKind) -> usize {
        self.sink
            .events
            .iter()
            .filter(|e| matches!(e, AppEvent::RecordWritten { kind: k, .. } if *k == kind))
            .count()
    }

    /// One data column, as text, for every record line after the header.
    fn column(&self, name: &str) -> Vec<String> {
        let lines = self.store.stream(RecordStream::Data);
        let idx = lines[0]
            .split(',')
            .position(|c| c == name)
            .unwrap_or_else(|| panic!("no column {name}"));
        lines[1..]
            .iter()
            .map(|l| l.split(',').nth(idx).unwrap().to_owned())
            .collect()
    }
}

/// Number of times a counter column falls back.
fn resets(values: &[f64]) -> usize {
    values.windows(2).filter(|w| w[1] < w[0]).count()
}

fn water_heater_only() -> SystemConfig {
    SystemConfig {
        furnace_present: false,
        ..SystemConfig::default()
    }
}

#[test]
fn burner_cycle_end_to_end() {
    let mut rig = Rig::new(water_heater_only());
    let mut start_plan = None;

    for now in T0 + 1..=T0 + 600 {
        rig.hw.temperature = match now - T0 {
            301..=360 => 240.0,
            // Thirty-second decay back to ambient.
            k @ 361..=390 => 240.0 - (k - 360) as f64 * 160.0 / 30.0,
            _ => 80.0,
        };
        let report = rig.tick(now);
        if now == T0 + 301 {
            start_plan = Some(report.plan);
        }
    }

    let wh_modes: Vec<(BurnerMode, BurnerMode)> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ModeChanged {
                appliance: Appliance::WaterHeater,
                from,
                to,
                ..
            } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        wh_modes,
        vec![
            (BurnerMode::Off, BurnerMode::JustStarted),
            (BurnerMode::JustStarted, BurnerMode::On),
            (BurnerMode::On, BurnerMode::JustStopped),
            (BurnerMode::JustStopped, BurnerMode::Cooling),
            (BurnerMode::Cooling, BurnerMode::Off),
        ]
    );

    let states: Vec<MonitorState> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            MonitorState::Start,
            MonitorState::On,
            MonitorState::Stop,
            MonitorState::CoolDown,
            MonitorState::Off,
        ]
    );
    assert_eq!(rig.svc.burner(Appliance::Furnace).mode(), BurnerMode::NotPresent);

    // Leaving Off writes the close-out and the first one-second record.
    assert_eq!(
        start_plan,
        Some(RecordPlan {
            close_out: true,
            single_scan: true
        })
    );

    // Close-outs: five idle minutes, leaving idle, one idle minute after.
    assert_eq!(rig.records_of(RecordKind::MultiScan), 7);
    // One-second records from Start through the last CoolDown tick.
    assert_eq!(rig.records_of(RecordKind::SingleScan), 239);
    assert_eq!(rig.store.stream(RecordStream::Data).len(), 1 + 7 + 239);
    assert_eq!(rig.svc.records().rec_num(), 246);

    // Start-up clears the pump twice; it then ran for the burn and stopped
    // in CoolDown, never capped.
    assert_eq!(rig.hw.writes_to(DigitalOutput::Pump), vec![false, false, true, false]);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::Co2Sampling(None)));

    // One run and one cool-down accumulate, then both reset in Off.
    let parse = |name: &str| -> Vec<f64> {
        rig.column(name).iter().map(|v| v.parse().unwrap()).collect()
    };
    let run = parse("sec_whrun");
    let cooldown = parse("sec_whcooldown");
    // Start through the decay's first tick, which still reads ON.
    assert_eq!(run.iter().copied().fold(0.0, f64::max), 61.0);
    // Cooling from the third decay tick to the second before Off.
    assert_eq!(cooldown.iter().copied().fold(0.0, f64::max), 177.0);
    assert_eq!(resets(&run), 1);
    assert_eq!(resets(&cooldown), 1);
    assert_eq!(run.last(), Some(&0.0));
    assert_eq!(cooldown.last(), Some(&0.0));
    assert!(parse("sec_frun").iter().all(|&v| v == 0.0));
}

#[test]
fn background_co2_sample_reaches_the_next_close_out() {
    // A four-hour boundary: 2023-11-15 00:00:00 UTC.
    const P: i64 = 1_700_006_400;
    let mut rig = Rig::starting_at(SystemConfig::default(), P - 300);
    rig.hw.co2 = 1234.0;
    for now in P - 299..=P + 180 {
        let report = rig.tick(now);
        if (P..P + 60).contains(&now) {
            assert_eq!(report.state, MonitorState::OffCO2, "at {now}");
        }
    }
    assert_eq!(rig.svc.co2().activations(), 1);

    let times = rig.column("time");
    let at = |name: &str, time: &str| {
        let row = times.iter().position(|t| t == time).unwrap();
        rig.column(name)[row].clone()
    };
    // Each valve committed once in the window; the last on the way out.
    for valve in ["whvent", "fvent", "zone"] {
        let name = format!("ppm_co2_{valve}");
        assert_eq!(at(&name, "\"2023-11-15 00:00:00\""), "NAN", "{name}");
        assert_eq!(at(&name, "\"2023-11-15 00:01:00\""), "1234", "{name}");
        assert_eq!(at(&name, "\"2023-11-15 00:02:00\""), "NAN", "{name}");
    }
    // Pressure commits land in the window they were taken in.
    assert!(rig.column("p_zero").iter().all(|v| v == "1.00"));
    assert!(rig.column("p_zone").iter().all(|v| v == "0.00"));
}

#[test]
fn burner_start_during_background_sample_moves_to_water_heater_vent() {
    const P: i64 = 1_700_006_400;
    let mut rig = Rig::starting_at(SystemConfig::default(), P - 60);
    for now in P - 59..=P + 45 {
        rig.tick(now);
    }
    assert_eq!(rig.svc.monitor_state(), MonitorState::OffCO2);
    assert_eq!(rig.svc.co2().active(), Some(Co2Valve::Zone));

    rig.hw.temperature = 240.0;
    let report = rig.tick(P + 46);
    assert_eq!(report.state, MonitorState::Start);
    assert_eq!(rig.svc.co2().active(), Some(Co2Valve::WhVent));
    assert!(rig.hw.is_on(DigitalOutput::Co2Valve(Co2Valve::WhVent)));
    assert!(!rig.hw.is_on(DigitalOutput::Co2Valve(Co2Valve::Zone)));
    assert!(rig.hw.is_on(DigitalOutput::Pump));
}

#[test]
fn every_data_line_matches_the_header_width() {
    let mut rig = Rig::new(water_heater_only());
    for now in T0 + 1..=T0 + 120 {
        rig.hw.temperature = if now > T0 + 100 { 300.0 } else { 80.0 };
        rig.tick(now);
    }
    let lines = rig.store.stream(RecordStream::Data);
    let width = lines[0].split(',').count();
    assert_eq!(width, rig.svc.data_registry().column_count());
    assert!(lines.len() > 3);
    for line in lines {
        assert_eq!(line.split(',').count(), width, "{line}");
    }
}

#[test]
fn shutdown_drops_outputs_and_flushes() {
    let mut rig = Rig::new(SystemConfig::default());
    for now in T0 + 1..=T0 + 5 {
        rig.tick(now);
    }
    rig.svc
        .shutdown(&mut rig.hw, &mut rig.store, &mut rig.sink)
        .unwrap();

    for output in DigitalOutput::all() {
        assert!(!rig.hw.is_on(output), "{output:?} left on");
    }
    assert_eq!(
        rig.hw.calls.last().map(|c| (c.output, c.on)),
        Some((DigitalOutput::Power24V, false))
    );
    assert!(rig.store.flushed);
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::Stopped));
}

#[test]
fn only_one_pressure_valve_is_ever_energised() {
    let mut rig = Rig::new(SystemConfig::default());
    let mut open: Vec<PressureValve> = Vec::new();
    rig.hw.calls.clear();
    open.push(PressureValve::Zero);

    for now in T0 + 1..=T0 + 40 {
        rig.tick(now);
        for call in rig.hw.calls.drain(..) {
            if let DigitalOutput::PressureValve(v) = call.output {
                if call.on {
                    open.push(v);
                } else {
                    open.retain(|o| *o != v);
                }
                assert!(open.len() <= 1, "two pressure valves open at {now}");
            }
        }
    }
}

#[test]
fn diagnostics_record_follows_its_interval() {
    let config = SystemConfig {
        diagnostics_interval_secs: 5,
        ..SystemConfig::default()
    };
    let mut rig = Rig::new(config);
    for now in T0 + 1..=T0 + 11 {
        rig.tick(now);
    }
    let diag = rig.store.stream(RecordStream::Diagnostics);
    assert!(diag[0].starts_with("site,time,diag_num,uptime_sec"));
    assert_eq!(diag.len(), 3);
    assert!(diag[1].starts_with("site,\""));
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::DiagnosticsWritten { diag_num: 2 }));
}

#[test]
fn rotation_checks_both_streams() {
    let mut rig = Rig::new(SystemConfig::default());
    for now in T0 + 1..=T0 + 61 {
        rig.tick(now);
    }
    assert_eq!(rig.store.rotate_calls, 2);
}

#[test]
fn low_disk_ends_the_run() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.store.free_bytes = 10;
    for now in T0 + 1..=T0 + 60 {
        rig.tick(now);
    }
    let err = rig
        .svc
        .tick(T0 + 61, &mut rig.hw, &mut rig.store, &mut rig.sink)
        .unwrap_err();
    assert_eq!(
        err,
        Error::Storage(StorageError::DiskNearlyFull {
            free_bytes: 10,
            threshold: 1_000_000
        })
    );
    assert!(rig.sink.events.contains(&AppEvent::DiskLow { free_bytes: 10 }));
}

#[test]
fn radio_samples_land_in_node_columns() {
    let mut config = SystemConfig::default();
    config.radio.nodes.push(RadioNodeConfig {
        name: "attic".into(),
        address: "0013A20040A1B2C3".into(),
    });
    let mut rig = Rig::new(config);
    let (tx, rx) = sample_queue();
    rig.svc.attach_radio(rx, Arc::new(RadioStats::default()));

    tx.send(RadioSample {
        address: 0x0013_A200_40A1_B2C3,
        analog: [Some(512), None, None, None],
        supply: Some(900),
    })
    .unwrap();
    tx.send(RadioSample {
        address: 0xDEAD,
        analog: [None; 4],
        supply: None,
    })
    .unwrap();
    rig.tick(T0 + 1);

    assert!(rig.sink.events.contains(&AppEvent::RadioDrained {
        samples: 2,
        unknown: 1
    }));
    let header = rig.svc.record_line(RecordKind::Header);
    assert!(header.ends_with("attic_batt,attic_batt_min,attic_batt_max,attic_batt_sd,attic_ain,attic_ain_min,attic_ain_max,attic_ain_sd,attic_n"));
    let line = rig.svc.record_line(RecordKind::SingleScan);
    let fields: Vec<&str> = line.split(',').collect();
    let n = fields.len();
    assert_eq!(fields[n - 1], "1");
    assert_eq!(fields[n - 9], "1.05");
}
