//! Unified error types for the combustion logger.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level loop's error handling uniform.  Sensor faults never reach this
//! type at runtime: a failed read is replaced by NaN at the port boundary
//! and only counted.  The variants that do surface are either fatal
//! (`Config`, `Storage`, `Init`) or logged-and-dropped (`Radio`).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the logger funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A sensor channel could not be opened or read.
    Sensor(SensorError),
    /// A record could not be persisted, or the disk is nearly full.
    Storage(StorageError),
    /// A radio frame was malformed.
    Radio(RadioError),
    /// Configuration is missing or invalid.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC channel file missing or unreadable.
    AdcReadFailed,
    /// I2C transfer failed.
    BusReadFailed,
    /// GPIO value file missing or unreadable.
    GpioFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::BusReadFailed => write!(f, "I2C read failed"),
            Self::GpioFailed => write!(f, "GPIO access failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Free space on the data volume fell below the configured floor.
    DiskNearlyFull { free_bytes: u64, threshold: u64 },
    /// Opening, writing or syncing a record file failed.
    Io(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiskNearlyFull {
                free_bytes,
                threshold,
            } => write!(
                f,
                "disk nearly full ({free_bytes} bytes free, floor {threshold})"
            ),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Declared frame length is zero or exceeds the decoder buffer.
    BadLength(usize),
    /// Frame checksum did not match.
    BadChecksum { expected: u8, actual: u8 },
    /// Payload is shorter than its frame type requires.
    Truncated,
    /// Frame type is not an IO sample.
    UnsupportedFrame(u8),
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLength(n) => write!(f, "bad frame length {n}"),
            Self::BadChecksum { expected, actual } => {
                write!(f, "checksum 0x{actual:02x}, expected 0x{expected:02x}")
            }
            Self::Truncated => write!(f, "truncated frame"),
            Self::UnsupportedFrame(id) => write!(f, "unsupported frame type 0x{id:02x}"),
        }
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file does not exist.
    NotFound(String),
    /// The config file could not be parsed.
    Parse(String),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config file not found: {path}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
