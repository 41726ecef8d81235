//! Combustion Logger: main entry point
//!
//! Hexagonal architecture driven by a 1 Hz wall-clock loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  LinuxHardware      DataFileStore   LogEventSink   SystemClock │
//! │  (Sensor+Actuator)  (RecordStore)   (EventSink)    (ClockPort) │
//! │  SimulatedHardware  RadioLink ──▶ bounded queue                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            LoggerService (pure logic)                  │    │
//! │  │  Burners · Monitor · Valve schedulers · Records        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Housekeeping (delegate-driven) · Watchdog                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, error, info, warn};

use combustion_logger::adapters::datafile::DataFileStore;
use combustion_logger::adapters::linux::LinuxHardware;
use combustion_logger::adapters::log_sink::LogEventSink;
use combustion_logger::adapters::radio_link::RadioLink;
use combustion_logger::adapters::sim::SimulatedHardware;
use combustion_logger::adapters::time::{SimulatedClock, SystemClock};
use combustion_logger::app::ports::{ActuatorPort, ClockPort, SensorPort};
use combustion_logger::app::service::LoggerService;
use combustion_logger::config::SystemConfig;
use combustion_logger::drivers::watchdog::Watchdog;
use combustion_logger::error::Error;

#[derive(Parser)]
#[command(name = "combustion-logger")]
#[command(version)]
#[command(about = "Combustion-safety data logger for water heaters and furnaces", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Run against simulated hardware and a simulated clock
    #[arg(long)]
    simulate: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the default configuration as JSON and exit
    #[arg(long)]
    print_default_config: bool,

    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,
}

/// Everything the loop drives besides the hardware.
struct Runtime {
    service: LoggerService,
    store: DataFileStore,
    sink: LogEventSink,
    watchdog: Watchdog,
    radio: Option<RadioLink>,
    running: Arc<AtomicBool>,
    max_ticks: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    if cli.print_default_config {
        println!("{}", serde_json::to_string_pretty(&SystemConfig::default())?);
        return Ok(());
    }

    info!("combustion-logger v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let config = match &cli.config {
        Some(path) => SystemConfig::load(path)
            .map_err(Error::from)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            warn!("no --config given, running with defaults");
            let config = SystemConfig::default();
            config.validate().map_err(Error::from)?;
            config
        }
    };

    // ── 2. Signal handling ────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("installing signal handler")?;

    // ── 3. Shared adapters ────────────────────────────────────
    let store = DataFileStore::new(&config.save_path, &config.site_name, config.max_file_size)
        .map_err(Error::from)
        .with_context(|| format!("preparing {}", config.save_path.display()))?;
    let mut service = LoggerService::new(config.clone());
    let radio = open_radio(&config);
    if let Some(link) = &radio {
        service.attach_radio(link.receiver(), link.stats());
    }

    let mut rt = Runtime {
        service,
        store,
        sink: LogEventSink::new(),
        watchdog: Watchdog::default(),
        radio,
        running,
        max_ticks: cli.max_ticks,
    };

    // ── 4. Hardware + loop ────────────────────────────────────
    if cli.simulate {
        let start = SystemClock::new().now();
        let mut hw = SimulatedHardware::default_profiles(start);
        let mut clock = SimulatedClock::starting_at(start);
        serve(&mut rt, &mut hw, &mut clock, SimulatedHardware::set_time)
    } else {
        rt.watchdog = Watchdog::open(config.hardware.watchdog.as_deref());
        let mut hw = LinuxHardware::open(&config).context("opening logger hardware")?;
        let mut clock = SystemClock::new();
        serve(&mut rt, &mut hw, &mut clock, |_, _| {})
    }
}

/// Start the radio reader when nodes are configured.  A port that fails to
/// open only disables radio columns.
fn open_radio(config: &SystemConfig) -> Option<RadioLink> {
    if config.radio.nodes.is_empty() {
        return None;
    }
    #[cfg(feature = "radio")]
    {
        let port = config.radio.port.as_deref()?;
        match RadioLink::open(port, config.radio.baud_rate) {
            Ok(link) => Some(link),
            Err(e) => {
                warn!("radio disabled: {}", e);
                None
            }
        }
    }
    #[cfg(not(feature = "radio"))]
    {
        warn!("radio nodes configured but built without the `radio` feature");
        None
    }
}

/// Run the tick loop until a signal, the tick limit or a fatal error, then
/// shut down in order: radio, outputs, rail, files.
fn serve<H>(
    rt: &mut Runtime,
    hw: &mut H,
    clock: &mut impl ClockPort,
    mut prepare: impl FnMut(&mut H, i64),
) -> Result<()>
where
    H: SensorPort + ActuatorPort,
{
    let now = clock.now();
    prepare(hw, now);
    rt.service
        .start(now, hw, &mut rt.store, &mut rt.sink)
        .context("starting logger")?;
    info!("System ready. Entering tick loop.");

    let mut ticks: u64 = 0;
    let outcome = loop {
        if !rt.running.load(Ordering::SeqCst) {
            info!("signal received, stopping");
            break Ok(());
        }
        if rt.max_ticks.is_some_and(|max| ticks >= max) {
            info!("tick limit {} reached", ticks);
            break Ok(());
        }

        clock.sleep_until_next_second();
        let now = clock.now();
        prepare(hw, now);
        if let Err(e) = rt.service.tick(now, hw, &mut rt.store, &mut rt.sink) {
            error!("tick failed: {}", e);
            break Err(e);
        }
        rt.watchdog.feed();
        ticks += 1;
    };

    if let Some(link) = &mut rt.radio {
        link.stop();
    }
    let closed = rt.service.shutdown(hw, &mut rt.store, &mut rt.sink);
    outcome.context("logger loop")?;
    closed.context("closing record files")?;
    Ok(())
}
