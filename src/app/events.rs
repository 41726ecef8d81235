//! Outbound application events.
//!
//! The [`LoggerService`](super::service::LoggerService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::burner::Appliance;
use crate::fsm::BurnerMode;
use crate::housekeeping::HousekeepingTask;
use crate::monitor::MonitorState;
use crate::record::RecordKind;
use crate::valves::Co2Valve;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Started {
        site: String,
        water_heater: bool,
        furnace: bool,
    },

    /// A burner changed mode.
    ModeChanged {
        appliance: Appliance,
        from: BurnerMode,
        to: BurnerMode,
        time_on: i64,
    },

    /// The monitor changed state.
    StateChanged { from: MonitorState, to: MonitorState },

    /// A data record line was written.
    RecordWritten { kind: RecordKind, rec_num: u64 },

    /// A diagnostics record was written.
    DiagnosticsWritten { diag_num: u64 },

    /// The CO2 pump started (`Some`) or stopped (`None`).
    Co2Sampling(Option<Co2Valve>),

    /// The tick timestamp went backwards.
    ClockAnomaly { previous: i64, now: i64 },

    /// Free disk space fell below the floor.
    DiskLow { free_bytes: u64 },

    /// A housekeeping task ran.
    Housekeeping(HousekeepingTask),

    /// Radio samples taken from the queue this tick.
    RadioDrained { samples: usize, unknown: usize },

    /// Outputs have been de-energised for shutdown.
    Stopped,
}
