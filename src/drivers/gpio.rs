//! Linux sysfs GPIO with embedded-hal digital traits.
//!
//! ```text
//!   /sys/class/gpio/export          ← "66"
//!   /sys/class/gpio/gpio66/direction ← "out"
//!   /sys/class/gpio/gpio66/value     ↔ "0" / "1"
//! ```
//!
//! A pin that is already exported is reused as is.

use core::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use log::debug;

use crate::error::{Error, SensorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

impl PinDirection {
    const fn sysfs(self) -> &'static str {
        match self {
            Self::Input => "in",
            Self::Output => "out",
        }
    }
}

/// A sysfs GPIO operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpioError {
    pub gpio: u32,
    pub kind: io::ErrorKind,
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio{}: {}", self.gpio, self.kind)
    }
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl From<GpioError> for Error {
    fn from(_: GpioError) -> Self {
        Self::Sensor(SensorError::GpioFailed)
    }
}

/// One exported sysfs GPIO line.
#[derive(Debug)]
pub struct SysfsPin {
    gpio: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    /// Export `gpio` under `root` (normally `/sys/class/gpio`) and set its
    /// direction.
    pub fn open(root: &Path, gpio: u32, direction: PinDirection) -> Result<Self, GpioError> {
        let err = |e: io::Error| GpioError {
            gpio,
            kind: e.kind(),
        };
        let dir = root.join(format!("gpio{gpio}"));
        if !dir.exists() {
            fs::write(root.join("export"), gpio.to_string()).map_err(err)?;
            debug!("gpio{}: exported", gpio);
        }
        fs::write(dir.join("direction"), direction.sysfs()).map_err(err)?;
        Ok(Self {
            gpio,
            value_path: dir.join("value"),
        })
    }

    pub fn gpio(&self) -> u32 {
        self.gpio
    }

    fn write(&self, high: bool) -> Result<(), GpioError> {
        fs::write(&self.value_path, if high { "1" } else { "0" }).map_err(|e| GpioError {
            gpio: self.gpio,
            kind: e.kind(),
        })
    }

    fn read(&self) -> Result<bool, GpioError> {
        let text = fs::read_to_string(&self.value_path).map_err(|e| GpioError {
            gpio: self.gpio,
            kind: e.kind(),
        })?;
        Ok(text.trim() == "1")
    }
}

impl ErrorType for SysfsPin {
    type Error = GpioError;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read().map(|high| !high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_sysfs(gpio: u32) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("export"), "").unwrap();
        fs::create_dir(root.path().join(format!("gpio{gpio}"))).unwrap();
        root
    }

    #[test]
    fn output_writes_value_file() {
        let root = fake_sysfs(66);
        let mut pin = SysfsPin::open(root.path(), 66, PinDirection::Output).unwrap();
        let dir = root.path().join("gpio66");
        assert_eq!(fs::read_to_string(dir.join("direction")).unwrap(), "out");

        pin.set_high().unwrap();
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "1");
        pin.set_low().unwrap();
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "0");
    }

    #[test]
    fn input_reads_value_file() {
        let root = fake_sysfs(46);
        let mut pin = SysfsPin::open(root.path(), 46, PinDirection::Input).unwrap();
        fs::write(root.path().join("gpio46/value"), "1\n").unwrap();
        assert!(pin.is_high().unwrap());
        fs::write(root.path().join("gpio46/value"), "0\n").unwrap();
        assert!(pin.is_low().unwrap());
    }

    #[test]
    fn unexported_pin_is_exported() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("export"), "").unwrap();
        // No kernel to create gpio27/, so setting the direction fails after
        // the export write.
        let err = SysfsPin::open(root.path(), 27, PinDirection::Input).unwrap_err();
        assert_eq!(err.gpio, 27);
        assert_eq!(fs::read_to_string(root.path().join("export")).unwrap(), "27");
    }
}
