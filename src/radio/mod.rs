//! XBee radio input: frame decoding and the bounded sample queue.
//!
//! ```text
//!   serial port ──▶ reader thread ──▶ FrameDecoder ──▶ parse_io_sample
//!                                                          │ try_send
//!                                                          ▼
//!                             bounded(256) ──▶ LoggerService::tick (drain)
//! ```
//!
//! The reader thread never blocks on the queue: when the control loop falls
//! behind, samples are dropped and counted.  Malformed frames are logged and
//! counted without touching any logger state.

pub mod frame;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, warn};

use crate::error::RadioError;
use frame::FrameDecoder;

/// Queue depth between the reader thread and the control loop.
pub const QUEUE_CAPACITY: usize = 256;

/// One IO sample, raw 10-bit ADC counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioSample {
    /// 64-bit source address.
    pub address: u64,
    /// AD0..AD3, `None` where not sampled.
    pub analog: [Option<u16>; 4],
    pub supply: Option<u16>,
}

/// Counters shared between the reader thread and the diagnostics record.
#[derive(Debug, Default)]
pub struct RadioStats {
    received: AtomicU64,
    errors: AtomicU64,
    dropped: AtomicU64,
}

impl RadioStats {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create the bounded sample queue.
pub fn sample_queue() -> (Sender<RadioSample>, Receiver<RadioSample>) {
    crossbeam_channel::bounded(QUEUE_CAPACITY)
}

/// Byte-stream front end of the reader thread: decodes frames and forwards
/// IO samples without blocking.
pub struct SamplePump {
    decoder: FrameDecoder,
    tx: Sender<RadioSample>,
    stats: Arc<RadioStats>,
}

impl SamplePump {
    pub fn new(tx: Sender<RadioSample>, stats: Arc<RadioStats>) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            tx,
            stats,
        }
    }

    /// Process bytes read from the port.  Returns `false` once the receiving
    /// side has gone away.
    pub fn ingest(&mut self, data: &[u8]) -> bool {
        let mut connected = true;
        let tx = &self.tx;
        let stats = &self.stats;
        self.decoder.feed(data, |result| {
            match result.and_then(frame::parse_io_sample) {
                Ok(sample) => match tx.try_send(sample) {
                    Ok(()) => {
                        stats.received.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Full(_)) => {
                        stats.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Disconnected(_)) => connected = false,
                },
                Err(RadioError::UnsupportedFrame(id)) => {
                    debug!("radio: ignoring frame type 0x{:02x}", id);
                }
                Err(e) => {
                    stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!("radio: {}", e);
                }
            }
        });
        connected
    }

    pub fn stats(&self) -> &Arc<RadioStats> {
        &self.stats
    }
}
