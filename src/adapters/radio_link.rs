//! XBee coordinator link: owns the serial port and its reader thread.
//!
//! The thread reads whatever the port delivers, runs it through a
//! [`SamplePump`], and exits when [`RadioLink::stop`] is called, the port
//! reaches end of file, or the control loop drops its receiver.  Read
//! timeouts are the idle case and only re-check the stop flag.

use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::radio::{RadioSample, RadioStats, SamplePump, sample_queue};

pub struct RadioLink {
    rx: Receiver<RadioSample>,
    stats: Arc<RadioStats>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RadioLink {
    /// Open `port` at `baud` and start reading.
    #[cfg(feature = "radio")]
    pub fn open(port: &str, baud: u32) -> Result<Self> {
        let serial = serialport::new(port, baud)
            .timeout(std::time::Duration::from_millis(100))
            .open()
            .map_err(|e| {
                warn!("radio: cannot open {} ({})", port, e);
                Error::Init("cannot open radio serial port")
            })?;
        info!("radio: {} @ {} baud", port, baud);
        Self::spawn(serial)
    }

    /// Start the reader thread over any byte source.
    pub fn spawn<R: Read + Send + 'static>(mut source: R) -> Result<Self> {
        let (tx, rx) = sample_queue();
        let stats = Arc::new(RadioStats::default());
        let stop = Arc::new(AtomicBool::new(false));

        let mut pump = SamplePump::new(tx, Arc::clone(&stats));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("xbee-rx".into())
            .spawn(move || {
                let mut buf = [0u8; 256];
                while !flag.load(Ordering::Relaxed) {
                    match source.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if !pump.ingest(&buf[..n]) {
                                break;
                            }
                        }
                        Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {}
                        Err(e) => {
                            warn!("radio: read failed ({}), reader stopped", e);
                            break;
                        }
                    }
                }
                info!("radio: reader exited");
            })
            .map_err(|_| Error::Init("cannot spawn radio reader"))?;

        Ok(Self {
            rx,
            stats,
            stop,
            handle: Some(handle),
        })
    }

    /// Queue end the control loop drains each tick.
    pub fn receiver(&self) -> Receiver<RadioSample> {
        self.rx.clone()
    }

    pub fn stats(&self) -> Arc<RadioStats> {
        Arc::clone(&self.stats)
    }

    /// Signal the reader and wait for it, closing the port.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("radio: reader panicked");
            }
        }
    }
}

impl Drop for RadioLink {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::frame::{FRAME_IO_SAMPLE, encode_frame};
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn reader_forwards_samples_until_eof() {
        let mut data = vec![FRAME_IO_SAMPLE];
        data.extend_from_slice(&0x0013_A200_40A1_B2C3u64.to_be_bytes());
        data.extend_from_slice(&[0xFF, 0xFE, 0x01, 0x01, 0x00, 0x00, 0x80, 0x03, 0x84]);
        let wire = encode_frame(&data).unwrap();

        let mut link = RadioLink::spawn(Cursor::new(wire)).unwrap();
        let sample = link
            .receiver()
            .recv_timeout(Duration::from_secs(2))
            .unwrap();
        assert_eq!(sample.address, 0x0013_A200_40A1_B2C3);
        assert_eq!(sample.supply, Some(900));
        link.stop();
        assert_eq!(link.stats().received(), 1);
    }
}
