//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr via `env_logger` in the binary).  Each event is
//! one line: a fixed-width tag, then `key=value` fields.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                site,
                water_heater,
                furnace,
            } => {
                info!("START | site={} | wh={} f={}", site, water_heater, furnace);
            }
            AppEvent::ModeChanged {
                appliance,
                from,
                to,
                time_on,
            } => {
                info!(
                    "MODE  | {} | {:?} -> {:?} | time_on={}s",
                    appliance.label(),
                    from,
                    to,
                    time_on
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::RecordWritten { kind, rec_num } => {
                debug!("REC   | {:?} | rec_num={}", kind, rec_num);
            }
            AppEvent::DiagnosticsWritten { diag_num } => {
                info!("DIAG  | diag_num={}", diag_num);
            }
            AppEvent::Co2Sampling(Some(valve)) => {
                info!("CO2   | pump=on valve={}", valve.name());
            }
            AppEvent::Co2Sampling(None) => {
                info!("CO2   | pump=off");
            }
            AppEvent::ClockAnomaly { previous, now } => {
                warn!("CLOCK | went backwards | previous={} now={}", previous, now);
            }
            AppEvent::DiskLow { free_bytes } => {
                warn!("DISK  | nearly full | free={}B", free_bytes);
            }
            AppEvent::Housekeeping(task) => {
                debug!("HOUSE | task={}", task.label());
            }
            AppEvent::RadioDrained { samples, unknown } => {
                debug!("RADIO | samples={} unknown={}", samples, unknown);
            }
            AppEvent::Stopped => {
                info!("STOP  | outputs off");
            }
        }
    }
}
