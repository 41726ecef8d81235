//! System configuration parameters
//!
//! All tunable parameters for a logger deployment.  Loaded once at startup
//! from a JSON file; missing fields fall back to [`SystemConfig::default`].
//! A config that fails [`SystemConfig::validate`] is fatal: the logger
//! refuses to enter its loop rather than record with bad timing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sensors::TcChannel;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Site ---
    /// Site name embedded in every record and file name.
    /// Letters, digits and underscores only.
    pub site_name: String,
    /// Water heater burner is instrumented
    pub water_heater_present: bool,
    /// Furnace burner is instrumented
    pub furnace_present: bool,

    // --- Storage ---
    /// Directory receiving data and diagnostics files
    pub save_path: PathBuf,
    /// Open a new data file once the active one exceeds this many bytes
    pub max_file_size: u64,
    /// Write a units row after the header row of each new file
    pub write_units_line: bool,
    /// Shut down cleanly once free space drops below this many bytes
    pub min_free_disk_bytes: u64,
    /// Free-space check interval (seconds)
    pub disk_check_interval_secs: u32,
    /// Diagnostics record interval (seconds)
    pub diagnostics_interval_secs: u32,

    // --- Burner classification ---
    /// Moving average above which an OFF burner is declared ON (deg F)
    pub t_on_threshold_f: f64,
    /// ON burner is declared OFF once its average falls this far below
    /// `t_on_threshold_f` (deg F)
    pub t_off_deadband_f: f64,
    /// Rise over the moving average that keeps an ON burner ON (deg F)
    pub dt_stay_on_f: f64,
    /// Fall below the moving average that keeps an OFF burner OFF (deg F)
    pub dt_stay_off_f: f64,
    /// Seconds of cooling after which a burner is always Off
    pub cooling_max_secs: i64,
    /// Seconds of cooling after which a burner goes Off at the top of a minute
    pub cooling_min_secs: i64,
    /// Cooling time at or below this value means the clock went backwards
    pub cooling_skew_floor_secs: i64,
    pub water_heater: BurnerConfig,
    pub furnace: BurnerConfig,

    // --- Monitor ---
    /// Length of the background CO2 sampling period (seconds)
    pub background_co2_period_secs: u32,
    /// Leading part of each background period spent in OffCO2 (seconds)
    pub background_co2_window_secs: u32,

    // --- Valves ---
    /// Pressure selector dwell per valve (seconds)
    pub pressure_dwell_secs: u32,
    /// Pressure readings discarded after each switch (seconds)
    pub pressure_clearance_secs: u32,
    /// CO2 selector dwell per valve (seconds)
    pub co2_dwell_secs: u32,
    /// CO2 readings discarded after each switch (seconds)
    pub co2_clearance_secs: u32,
    /// Continuous burner on-time after which the CO2 pump is stopped (seconds)
    pub pump_cap_secs: u32,
    /// Pressure reads averaged per scan
    pub pressure_oversample: u16,
    /// Spacing of oversampled pressure reads (microseconds)
    pub pressure_oversample_interval_us: u32,

    // --- Records ---
    /// Aggregate record cadence while burners are idle (seconds)
    pub multi_scan_period_secs: i64,
    /// A record is forced once this long has passed without one (seconds)
    pub record_safety_net_secs: i64,

    // --- Peripherals ---
    pub radio: RadioConfig,
    pub hardware: HardwareConfig,
}

/// Per-burner classifier settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BurnerConfig {
    /// Thermocouple channel at the burner
    pub tc: TcChannel,
    /// Rise over the moving average that switches the burner ON (deg F)
    pub dt_on_f: f64,
    /// Fall below the moving average that switches the burner OFF (deg F)
    pub dt_off_f: f64,
}

/// XBee radio link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Serial device of the coordinator, e.g. `/dev/ttyO1`
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Remote nodes whose samples are recorded
    pub nodes: Vec<RadioNodeConfig>,
}

/// A remote sensor node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioNodeConfig {
    /// Column prefix in records
    pub name: String,
    /// 64-bit source address, hex
    pub address: String,
}

/// Linux device paths for the Linux hardware adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// sysfs GPIO root
    pub gpio_root: PathBuf,
    /// sysfs IIO root
    pub iio_root: PathBuf,
    /// IIO device numbers of the four thermocouple ADCs, 4 channels each
    pub tc_devices: Vec<u8>,
    /// IIO (device, channel) of the CO amplifier
    pub co_channel: (u8, u8),
    /// IIO (device, channel) of the CO2 transmitter
    pub co2_channel: (u8, u8),
    /// CO2 transmitter output scaling
    pub co2_ppm_per_volt: f64,
    /// IIO (device, channel) of the door position sensor
    pub door_channel: (u8, u8),
    /// IIO (device, channel) of the two fan current sensors
    pub fan_channels: [(u8, u8); 2],
    /// I2C bus of the DLVR pressure sensor
    pub i2c_bus: PathBuf,
    pub dlvr_address: u16,
    /// Hardware watchdog device; `None` disables feeding
    pub watchdog: Option<PathBuf>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Site
            site_name: "site".into(),
            water_heater_present: true,
            furnace_present: true,

            // Storage
            save_path: PathBuf::from("/root/uSDcard/data"),
            max_file_size: 750_000_000,
            write_units_line: false,
            min_free_disk_bytes: 1_000_000,
            disk_check_interval_secs: 60,
            diagnostics_interval_secs: 86_400, // daily

            // Burner classification
            t_on_threshold_f: 250.0,
            t_off_deadband_f: 50.0,
            dt_stay_on_f: 8.0,
            dt_stay_off_f: -5.0,
            cooling_max_secs: 180,
            cooling_min_secs: 120,
            cooling_skew_floor_secs: -10,
            water_heater: BurnerConfig {
                tc: TcChannel(0), // TC1@U11
                dt_on_f: 5.0,
                dt_off_f: -5.0,
            },
            furnace: BurnerConfig {
                tc: TcChannel(6), // TC7@U13
                dt_on_f: 5.0,
                dt_off_f: -5.0,
            },

            // Monitor
            background_co2_period_secs: 4 * 3600,
            background_co2_window_secs: 60,

            // Valves
            pressure_dwell_secs: 3,
            pressure_clearance_secs: 2,
            co2_dwell_secs: 20,
            co2_clearance_secs: 15,
            pump_cap_secs: 900,
            pressure_oversample: 25,
            pressure_oversample_interval_us: 6_600,

            // Records
            multi_scan_period_secs: 60,
            record_safety_net_secs: 120,

            radio: RadioConfig::default(),
            hardware: HardwareConfig::default(),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from("/sys/class/gpio"),
            iio_root: PathBuf::from("/sys/bus/iio/devices"),
            tc_devices: vec![0, 1, 2, 3], // U11 U13 U14 U15
            co_channel: (4, 3),           // U8 AIN3
            co2_channel: (5, 0),          // U9 AIN0
            co2_ppm_per_volt: 1000.0,
            door_channel: (4, 0),         // U8 AIN0
            fan_channels: [(4, 1), (4, 2)],
            i2c_bus: PathBuf::from("/dev/i2c-1"),
            dlvr_address: 0x28,
            watchdog: Some(PathBuf::from("/dev/watchdog")),
        }
    }
}

impl SystemConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Parse(e.to_string()),
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the timing rules inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_name.is_empty()
            || !self
                .site_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::ValidationFailed(
                "site_name must be non-empty letters, digits or underscores",
            ));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::ValidationFailed("max_file_size must be > 0"));
        }
        if self.diagnostics_interval_secs == 0 || self.disk_check_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "housekeeping intervals must be > 0",
            ));
        }
        if self.t_off_deadband_f < 0.0 || self.t_off_deadband_f >= self.t_on_threshold_f {
            return Err(ConfigError::ValidationFailed(
                "t_off_deadband_f must lie in [0, t_on_threshold_f)",
            ));
        }
        if self.dt_stay_off_f >= 0.0 || self.dt_stay_on_f <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "dt_stay_off_f must be < 0 and dt_stay_on_f > 0",
            ));
        }
        for burner in [&self.water_heater, &self.furnace] {
            if burner.dt_on_f <= 0.0 || burner.dt_off_f >= 0.0 {
                return Err(ConfigError::ValidationFailed(
                    "burner dt_on_f must be > 0 and dt_off_f < 0",
                ));
            }
            if !burner.tc.is_valid() {
                return Err(ConfigError::ValidationFailed("burner tc channel out of range"));
            }
        }
        if self.cooling_min_secs <= 0 || self.cooling_min_secs > self.cooling_max_secs {
            return Err(ConfigError::ValidationFailed(
                "cooling_min_secs must lie in (0, cooling_max_secs]",
            ));
        }
        if self.cooling_skew_floor_secs >= 0 {
            return Err(ConfigError::ValidationFailed(
                "cooling_skew_floor_secs must be negative",
            ));
        }
        if self.background_co2_window_secs == 0
            || self.background_co2_window_secs >= self.background_co2_period_secs
        {
            return Err(ConfigError::ValidationFailed(
                "background CO2 window must be shorter than its period",
            ));
        }
        if self.pressure_clearance_secs >= self.pressure_dwell_secs {
            return Err(ConfigError::ValidationFailed(
                "pressure clearance must be shorter than its dwell",
            ));
        }
        if self.co2_clearance_secs >= self.co2_dwell_secs {
            return Err(ConfigError::ValidationFailed(
                "CO2 clearance must be shorter than its dwell",
            ));
        }
        if self.pump_cap_secs == 0 {
            return Err(ConfigError::ValidationFailed("pump_cap_secs must be > 0"));
        }
        if self.pressure_oversample == 0 {
            return Err(ConfigError::ValidationFailed("pressure_oversample must be > 0"));
        }
        if self.multi_scan_period_secs <= 0
            || self.record_safety_net_secs <= self.multi_scan_period_secs
        {
            return Err(ConfigError::ValidationFailed(
                "record safety net must exceed the multi-scan period",
            ));
        }
        if self.hardware.tc_devices.len() * 4 < usize::from(TcChannel::COUNT) {
            return Err(ConfigError::ValidationFailed(
                "hardware.tc_devices must cover 16 thermocouple channels",
            ));
        }
        self.validate_radio()
    }

    fn validate_radio(&self) -> Result<(), ConfigError> {
        if self.radio.nodes.is_empty() {
            return Ok(());
        }
        if self.radio.port.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::ValidationFailed(
                "radio.port is required when radio nodes are configured",
            ));
        }
        if self.radio.baud_rate == 0 {
            return Err(ConfigError::ValidationFailed("radio.baud_rate must be > 0"));
        }
        for (i, node) in self.radio.nodes.iter().enumerate() {
            if node.name.is_empty() {
                return Err(ConfigError::ValidationFailed("radio node name is empty"));
            }
            if node.address_u64().is_none() {
                return Err(ConfigError::ValidationFailed(
                    "radio node address must be 16 hex digits",
                ));
            }
            if self.radio.nodes[..i].iter().any(|n| n.name == node.name) {
                return Err(ConfigError::ValidationFailed("duplicate radio node name"));
            }
        }
        Ok(())
    }
}

impl RadioNodeConfig {
    /// Parse the configured hex address.
    pub fn address_u64(&self) -> Option<u64> {
        let hex = self.address.trim_start_matches("0x");
        if hex.len() != 16 {
            return None;
        }
        u64::from_str_radix(hex, 16).ok()
    }
}
