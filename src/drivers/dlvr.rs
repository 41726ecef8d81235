//! All Sensors DLVR differential-pressure transducer on Linux i2c-dev.
//!
//! The part streams its latest conversion on every read: two bytes, status
//! in the top two bits, 14-bit count below.  The word is handed on packed
//! big-endian and decoded by [`Converter::Dlvr`](crate::sensors::Converter).

use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::fd::AsRawFd;
use std::path::Path;

use log::info;

use crate::error::{Error, Result, SensorError};
use crate::sensors::Channel;

/// `I2C_SLAVE` from `linux/i2c-dev.h`.
const I2C_SLAVE: libc::Ioctl = 0x0703;

pub struct DlvrChannel {
    bus: File,
}

impl DlvrChannel {
    pub fn open(bus: &Path, address: u16) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(bus)
            .map_err(|_| Error::Init("cannot open i2c bus"))?;
        // SAFETY: `file` is an open i2c-dev descriptor for the duration of
        // the call, and I2C_SLAVE takes the address by value.
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), I2C_SLAVE, libc::c_ulong::from(address)) };
        if rc < 0 {
            return Err(Error::Init("cannot select DLVR address"));
        }
        info!("DLVR: {} @ 0x{:02x}", bus.display(), address);
        Ok(Self { bus: file })
    }
}

impl Channel for DlvrChannel {
    fn read_raw(&mut self) -> Result<f64> {
        let mut buf = [0u8; 2];
        self.bus
            .read_exact(&mut buf)
            .map_err(|_| SensorError::BusReadFailed)?;
        Ok(f64::from(u16::from_be_bytes(buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bus_fails_to_open() {
        let err = DlvrChannel::open(Path::new("/nonexistent/i2c-9"), 0x28).err();
        assert_eq!(err, Some(Error::Init("cannot open i2c bus")));
    }
}
