//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LoggerService (domain)
//! ```
//!
//! Driven adapters (sensors, outputs, clock, record files, event sinks)
//! implement these traits.  The [`LoggerService`](super::service::LoggerService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! Sensor reads are infallible at this boundary: an adapter that cannot
//! read a channel returns NaN and the core records "no data".

use crate::error::StorageError;
use crate::housekeeping::HousekeepingTask;
use crate::sensors::{AnalogInput, DigitalInput, TcChannel};
use crate::valves::{Co2Valve, PressureValve};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port, called once per input per tick.
pub trait SensorPort {
    /// Thermocouple temperature, °F.
    fn read_temperature(&mut self, channel: TcChannel) -> f64;

    /// Door position (fraction), fan current (A) or CO (ppm).
    fn read_analog(&mut self, input: AnalogInput) -> f64;

    /// Differential pressure at the selector, Pa.  Oversampled by the
    /// adapter; not zero-corrected.
    fn read_pressure(&mut self) -> f64;

    /// CO2 analyser output, ppm.
    fn read_co2_raw(&mut self) -> f64;

    fn read_digital_input(&mut self, input: DigitalInput) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Every switched output on the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalOutput {
    PressureValve(PressureValve),
    Co2Valve(Co2Valve),
    Pump,
    /// 24 V rail feeding the solenoids and pump.
    Power24V,
}

impl DigitalOutput {
    pub fn all() -> impl Iterator<Item = Self> {
        PressureValve::ALL
            .into_iter()
            .map(Self::PressureValve)
            .chain(Co2Valve::ALL.into_iter().map(Self::Co2Valve))
            .chain([Self::Pump, Self::Power24V])
    }
}

/// Write-side port.
pub trait ActuatorPort {
    fn write_digital_output(&mut self, output: DigitalOutput, on: bool);

    /// De-energise the pump and every valve.  The 24 V rail is left alone.
    fn all_valves_off(&mut self) {
        for output in DigitalOutput::all().filter(|o| *o != DigitalOutput::Power24V) {
            self.write_digital_output(output, false);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// UTC epoch seconds.
    fn now(&self) -> i64;

    /// Block until the next wall-clock second begins.
    fn sleep_until_next_second(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Record store (driven adapter: domain → data files)
// ───────────────────────────────────────────────────────────────

/// The two output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStream {
    /// `_scanData.dat`, one line per data record.
    Data,
    /// `_scanInfo.csv`, one line per diagnostics record.
    Diagnostics,
}

impl RecordStream {
    pub const ALL: [Self; 2] = [Self::Data, Self::Diagnostics];

    /// File name suffix after the site name.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Data => "scanData.dat",
            Self::Diagnostics => "scanInfo.csv",
        }
    }
}

/// Append-only line store with size-based rotation.
///
/// Every file a stream opens starts with that stream's preamble (the header
/// line and, optionally, the units line).
pub trait RecordStore {
    /// Open the first file of `stream`, named for `now`, and remember its
    /// preamble for later rotations.
    fn begin_stream(
        &mut self,
        stream: RecordStream,
        now: i64,
        preamble: &[String],
    ) -> Result<(), StorageError>;

    fn append_record_line(&mut self, stream: RecordStream, line: &str) -> Result<(), StorageError>;

    /// Size of the active file, bytes.
    fn current_file_size(&self, stream: RecordStream) -> u64;

    /// Start a new file if the active one has outgrown its limit.  Returns
    /// whether a new file was opened.
    fn rotate_file_if_oversize(&mut self, stream: RecordStream, now: i64) -> Result<bool, StorageError>;

    /// Free space on the data volume, bytes.
    fn free_disk_bytes(&self) -> Result<u64, StorageError>;

    fn flush(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Housekeeping delegate (decouples the timer from the service)
// ───────────────────────────────────────────────────────────────

/// Callback the [`Housekeeping`](crate::housekeeping::Housekeeping) timer
/// invokes when a task comes due.
pub trait HousekeepingDelegate {
    fn on_task_due(&mut self, task: HousekeepingTask, now: i64);
}
