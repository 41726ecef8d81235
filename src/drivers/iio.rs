//! Linux IIO ADC channel.
//!
//! The ADS1115 converters on the logger cape are bound to the kernel
//! `ads1015` driver, which exposes each input as
//! `iio:deviceN/in_voltageC_raw` with a millivolt-per-count
//! `in_voltageC_scale`.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Result, SensorError};
use crate::sensors::Channel;

pub struct IioChannel {
    raw_path: PathBuf,
    /// Volts per count.
    scale: f64,
}

impl IioChannel {
    /// Bind `in_voltage{channel}` of `iio:device{device}`.  A missing or
    /// unreadable scale file falls back to 1 mV per count.
    pub fn new(iio_root: &Path, device: u8, channel: u8) -> Self {
        let dir = iio_root.join(format!("iio:device{device}"));
        let scale_path = dir.join(format!("in_voltage{channel}_scale"));
        let scale_mv = fs::read_to_string(&scale_path)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or_else(|| {
                warn!("{}: no scale, assuming 1 mV/count", scale_path.display());
                1.0
            });
        Self {
            raw_path: dir.join(format!("in_voltage{channel}_raw")),
            scale: scale_mv / 1000.0,
        }
    }
}

impl Channel for IioChannel {
    fn read_raw(&mut self) -> Result<f64> {
        let text =
            fs::read_to_string(&self.raw_path).map_err(|_| SensorError::AdcReadFailed)?;
        let counts: i32 = text.trim().parse().map_err(|_| SensorError::AdcReadFailed)?;
        Ok(f64::from(counts) * self.scale)
    }
}
