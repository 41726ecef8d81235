//! Mock adapters for integration tests.
//!
//! Records every output write, record line and event so tests can assert on
//! the full history without touching GPIO or the filesystem.

use std::collections::HashMap;

use combustion_logger::app::events::AppEvent;
use combustion_logger::app::ports::{
    ActuatorPort, DigitalOutput, EventSink, RecordStore, RecordStream, SensorPort,
};
use combustion_logger::error::StorageError;
use combustion_logger::sensors::{AnalogInput, DigitalInput, TcChannel};

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCall {
    pub output: DigitalOutput,
    pub on: bool,
}

// ── MockHardware ──────────────────────────────────────────────

/// Every thermocouple reads `temperature`; pressure and CO2 are fixed.
pub struct MockHardware {
    pub temperature: f64,
    pub pressure: f64,
    pub co2: f64,
    pub calls: Vec<OutputCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(temperature: f64) -> Self {
        Self {
            temperature,
            pressure: 1.0,
            co2: 450.0,
            calls: Vec::new(),
        }
    }

    /// Last commanded level of `output`.
    pub fn is_on(&self, output: DigitalOutput) -> bool {
        self.calls
            .iter()
            .rev()
            .find(|c| c.output == output)
            .is_some_and(|c| c.on)
    }

    pub fn writes_to(&self, output: DigitalOutput) -> Vec<bool> {
        self.calls
            .iter()
            .filter(|c| c.output == output)
            .map(|c| c.on)
            .collect()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self, _channel: TcChannel) -> f64 {
        self.temperature
    }

    fn read_analog(&mut self, _input: AnalogInput) -> f64 {
        0.0
    }

    fn read_pressure(&mut self) -> f64 {
        self.pressure
    }

    fn read_co2_raw(&mut self) -> f64 {
        self.co2
    }

    fn read_digital_input(&mut self, _input: DigitalInput) -> bool {
        false
    }
}

impl ActuatorPort for MockHardware {
    fn write_digital_output(&mut self, output: DigitalOutput, on: bool) {
        self.calls.push(OutputCall { output, on });
    }
}

// ── MemoryStore ───────────────────────────────────────────────

/// In-memory [`RecordStore`]: one line list per stream.
pub struct MemoryStore {
    pub lines: HashMap<RecordStream, Vec<String>>,
    pub free_bytes: u64,
    pub rotate_calls: u32,
    pub flushed: bool,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            lines: HashMap::new(),
            free_bytes: u64::MAX,
            rotate_calls: 0,
            flushed: false,
        }
    }

    pub fn stream(&self, stream: RecordStream) -> &[String] {
        self.lines.get(&stream).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn begin_stream(
        &mut self,
        stream: RecordStream,
        _now: i64,
        preamble: &[String],
    ) -> Result<(), StorageError> {
        self.lines.insert(stream, preamble.to_vec());
        Ok(())
    }

    fn append_record_line(&mut self, stream: RecordStream, line: &str) -> Result<(), StorageError> {
        self.lines.entry(stream).or_default().push(line.to_owned());
        Ok(())
    }

    fn current_file_size(&self, stream: RecordStream) -> u64 {
        self.stream(stream).iter().map(|l| l.len() as u64 + 1).sum()
    }

    fn rotate_file_if_oversize(&mut self, _stream: RecordStream, _now: i64) -> Result<bool, StorageError> {
        self.rotate_calls += 1;
        Ok(false)
    }

    fn free_disk_bytes(&self) -> Result<u64, StorageError> {
        Ok(self.free_bytes)
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.flushed = true;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
