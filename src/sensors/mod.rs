//! Sensor subsystem: input identities, the [`Channel`] capability and the
//! per-sensor [`Converter`] strategy, plus the [`SensorSeries`] accumulator.
//!
//! ```text
//!   Channel (raw volts / counts) ──▶ Converter ──▶ engineering units
//!        ▲                                            │
//!   IIO file, i2c-dev, simulation                     ▼
//!                                              SensorPort reading
//! ```
//!
//! Hardware adapters own one [`Sensor`] per physical input and answer the
//! `SensorPort` calls with it.  The domain core only ever sees converted
//! values, NaN standing in for any failed read.

pub mod convert;
pub mod pressure;
pub mod series;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
pub use convert::Converter;
pub use series::SensorSeries;

// ---------------------------------------------------------------------------
// Input identities
// ---------------------------------------------------------------------------

/// One of the sixteen thermocouple amplifier channels (0-based; TC1 is 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TcChannel(pub u8);

impl TcChannel {
    pub const COUNT: u8 = 16;

    pub fn is_valid(self) -> bool {
        self.0 < Self::COUNT
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Analog inputs other than thermocouples, pressure and CO2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogInput {
    /// Door position, fraction open
    Door1,
    /// Fan current 1
    Fan1,
    /// Fan current 2
    Fan2,
    /// CO concentration
    Co,
}

impl AnalogInput {
    pub const ALL: [Self; 4] = [Self::Door1, Self::Fan1, Self::Fan2, Self::Co];
}

/// Spare digital inputs (door switches).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitalInput {
    Switch1,
    Switch2,
}

impl DigitalInput {
    pub const ALL: [Self; 2] = [Self::Switch1, Self::Switch2];
}

// ---------------------------------------------------------------------------
// Channel + Converter composition
// ---------------------------------------------------------------------------

/// Raw read capability of a physical input.
pub trait Channel: Send {
    /// Read one raw value (volts for ADC channels, a status/count word for
    /// the DLVR).
    fn read_raw(&mut self) -> Result<f64>;
}

/// A physical input: where the raw value comes from and how to convert it.
pub struct Sensor {
    name: String,
    channel: Box<dyn Channel>,
    converter: Converter,
}

impl Sensor {
    pub fn new(name: impl Into<String>, channel: Box<dyn Channel>, converter: Converter) -> Self {
        Self {
            name: name.into(),
            channel,
            converter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read and convert.  Failures become NaN.
    pub fn read(&mut self) -> f64 {
        match self.channel.read_raw() {
            Ok(raw) => self.converter.apply(raw),
            Err(e) => {
                debug!("{}: read failed ({})", self.name, e);
                f64::NAN
            }
        }
    }
}
