//! Linux hardware watchdog driver.
//!
//! Opening `/dev/watchdog` arms the timer; every write restarts it.  The
//! main loop calls [`Watchdog::feed`] once per tick, so a stalled loop
//! resets the board.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::{info, warn};

#[derive(Debug, Default)]
pub struct Watchdog {
    device: Option<File>,
}

impl Watchdog {
    /// Arm the watchdog at `path`.  `None`, or a device that cannot be
    /// opened, gives a no-op watchdog.
    pub fn open(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("Watchdog: disabled");
            return Self::default();
        };
        match OpenOptions::new().write(true).open(path) {
            Ok(device) => {
                info!("Watchdog: armed ({})", path.display());
                Self {
                    device: Some(device),
                }
            }
            Err(e) => {
                warn!("Watchdog: cannot open {} ({}), not fed", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.device.is_some()
    }

    /// Restart the countdown.
    pub fn feed(&mut self) {
        if let Some(device) = &mut self.device {
            if let Err(e) = device.write_all(b"\n").and_then(|()| device.flush()) {
                warn!("Watchdog: feed failed ({})", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feeds_newlines() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut wd = Watchdog::open(Some(file.path()));
        assert!(wd.is_armed());
        wd.feed();
        wd.feed();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"\n\n");
    }

    #[test]
    fn disabled_is_noop() {
        let mut wd = Watchdog::open(None);
        assert!(!wd.is_armed());
        wd.feed();
    }
}
