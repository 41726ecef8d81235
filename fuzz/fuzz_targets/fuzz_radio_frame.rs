//! Fuzz target: XBee `FrameDecoder::feed` + `parse_io_sample`
//!
//! Drives arbitrary byte sequences through the streaming frame decoder and
//! the IO-sample parser, asserting that neither panics, frames stay within
//! the decoder buffer, and a reset decoder accepts the same bytes again.
//!
//! cargo fuzz run fuzz_radio_frame

#![no_main]

use combustion_logger::radio::frame::{FrameDecoder, parse_io_sample};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();
    let mut frames = 0usize;

    decoder.feed(data, |result| {
        if let Ok(frame) = result {
            assert!(!frame.is_empty(), "decoder must not yield empty frames");
            assert!(frame.len() <= 256, "frame exceeds decoder buffer");
            frames += 1;
            let _ = parse_io_sample(frame);
        }
    });

    decoder.reset();
    let mut again = 0usize;
    decoder.feed(data, |result| {
        if result.is_ok() {
            again += 1;
        }
    });
    assert_eq!(frames, again, "decoder is not deterministic after reset");
});
