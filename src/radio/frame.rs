//! XBee API frame codec.
//!
//! Wire format (API mode 1, no escaping):
//! ```text
//! ┌──────┬──────────────┬───────────────────────┬──────────┐
//! │ 0x7E │ Length (2B)  │ Frame data (N bytes)  │ Checksum │
//! │      │ BE u16       │ type byte + payload   │ 1 byte   │
//! └──────┴──────────────┴───────────────────────┴──────────┘
//! ```
//!
//! The checksum is `0xFF - (sum of frame data & 0xFF)`.  The decoder is fed
//! arbitrary chunks from the serial port and yields every complete frame;
//! a bad length or checksum resynchronises on the next delimiter.

use crate::error::RadioError;

use super::RadioSample;

pub const START_DELIMITER: u8 = 0x7E;
/// IO data sample RX indicator.
pub const FRAME_IO_SAMPLE: u8 = 0x92;

/// Largest frame data the decoder buffers.
const MAX_FRAME_SIZE: usize = 256;

/// Bit 7 of the analog mask selects the supply-voltage sample.
const SUPPLY_MASK_BIT: u8 = 0x80;
/// Fixed part of an IO sample frame, type byte included.
const IO_SAMPLE_HEADER: usize = 16;

/// Decoder state machine.
enum DecoderState {
    /// Hunting for `0x7E`.
    Delimiter,
    /// Reading the two length bytes.
    Length { collected: usize, value: usize },
    /// Reading frame data.
    Payload { expected: usize, collected: usize },
    /// Reading the checksum byte.
    Checksum { expected: usize },
}

/// Streaming frame decoder.
pub struct FrameDecoder {
    state: DecoderState,
    payload_buf: [u8; MAX_FRAME_SIZE],
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Delimiter,
            payload_buf: [0; MAX_FRAME_SIZE],
        }
    }

    /// Feed one byte.  Returns the frame data once a frame completes.
    pub fn push(&mut self, byte: u8) -> Option<Result<&[u8], RadioError>> {
        match &mut self.state {
            DecoderState::Delimiter => {
                if byte == START_DELIMITER {
                    self.state = DecoderState::Length {
                        collected: 0,
                        value: 0,
                    };
                }
                None
            }

            DecoderState::Length { collected, value } => {
                *value = (*value << 8) | usize::from(byte);
                *collected += 1;
                if *collected < 2 {
                    return None;
                }
                let expected = *value;
                if expected == 0 || expected > MAX_FRAME_SIZE {
                    self.state = DecoderState::Delimiter;
                    return Some(Err(RadioError::BadLength(expected)));
                }
                self.state = DecoderState::Payload {
                    expected,
                    collected: 0,
                };
                None
            }

            DecoderState::Payload {
                expected,
                collected,
            } => {
                self.payload_buf[*collected] = byte;
                *collected += 1;
                if *collected == *expected {
                    self.state = DecoderState::Checksum {
                        expected: *expected,
                    };
                }
                None
            }

            DecoderState::Checksum { expected } => {
                let len = *expected;
                self.state = DecoderState::Delimiter;
                let want = checksum(&self.payload_buf[..len]);
                if byte != want {
                    return Some(Err(RadioError::BadChecksum {
                        expected: want,
                        actual: byte,
                    }));
                }
                Some(Ok(&self.payload_buf[..len]))
            }
        }
    }

    /// Feed a chunk, calling `on_frame` for every completed frame or error.
    pub fn feed(&mut self, data: &[u8], mut on_frame: impl FnMut(Result<&[u8], RadioError>)) {
        for &byte in data {
            if let Some(result) = self.push(byte) {
                on_frame(result);
            }
        }
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = DecoderState::Delimiter;
    }
}

pub fn checksum(frame_data: &[u8]) -> u8 {
    let sum = frame_data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0xFF - sum
}

/// Wrap frame data in delimiter, length and checksum.
pub fn encode_frame(frame_data: &[u8]) -> Option<Vec<u8>> {
    if frame_data.is_empty() || frame_data.len() > MAX_FRAME_SIZE {
        return None;
    }
    let len = u16::try_from(frame_data.len()).ok()?;
    let mut out = Vec::with_capacity(frame_data.len() + 4);
    out.push(START_DELIMITER);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(frame_data);
    out.push(checksum(frame_data));
    Some(out)
}

/// Decode an IO sample frame into raw ADC counts.
pub fn parse_io_sample(frame: &[u8]) -> Result<RadioSample, RadioError> {
    let (&frame_type, _) = frame.split_first().ok_or(RadioError::Truncated)?;
    if frame_type != FRAME_IO_SAMPLE {
        return Err(RadioError::UnsupportedFrame(frame_type));
    }
    if frame.len() < IO_SAMPLE_HEADER {
        return Err(RadioError::Truncated);
    }

    let mut addr = [0u8; 8];
    addr.copy_from_slice(&frame[1..9]);
    let address = u64::from_be_bytes(addr);
    let digital_mask = u16::from_be_bytes([frame[13], frame[14]]);
    let analog_mask = frame[15];

    let mut cursor = IO_SAMPLE_HEADER;
    if digital_mask != 0 {
        cursor += 2;
    }

    let mut analog = [None; 4];
    let mut supply = None;
    for bit in (0..4).chain(std::iter::once(7)) {
        if analog_mask & (1 << bit) == 0 {
            continue;
        }
        let word = frame
            .get(cursor..cursor + 2)
            .ok_or(RadioError::Truncated)?;
        let counts = u16::from_be_bytes([word[0], word[1]]);
        cursor += 2;
        if analog_mask & (1 << bit) == SUPPLY_MASK_BIT {
            supply = Some(counts);
        } else {
            analog[bit] = Some(counts);
        }
    }

    Ok(RadioSample {
        address,
        analog,
        supply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// IO sample from 0013A200 40522BAA: AD1 + supply, with a digital word.
    fn sample_frame() -> Vec<u8> {
        let mut data = vec![FRAME_IO_SAMPLE];
        data.extend_from_slice(&[0x00, 0x13, 0xA2, 0x00, 0x40, 0x52, 0x2B, 0xAA]);
        data.extend_from_slice(&[0x7D, 0x84]); // 16-bit source
        data.push(0x01); // options
        data.push(0x01); // sample count
        data.extend_from_slice(&[0x00, 0x1C]); // digital mask
        data.push(0x82); // analog mask: AD1 + supply
        data.extend_from_slice(&[0x00, 0x14]); // digital samples
        data.extend_from_slice(&[0x02, 0x25]); // AD1
        data.extend_from_slice(&[0x03, 0x50]); // supply
        data
    }

    #[test]
    fn checksum_matches_reference() {
        // AT command "MY" from the XBee API reference.
        assert_eq!(checksum(&[0x08, 0x01, 0x4D, 0x59]), 0x50);
    }

    #[test]
    fn decodes_split_chunks() {
        let wire = encode_frame(&sample_frame()).unwrap();
        let mut dec = FrameDecoder::new();
        let mut frames = Vec::new();
        let (a, b) = wire.split_at(7);
        dec.feed(a, |r| frames.push(r.map(<[u8]>::to_vec)));
        assert!(frames.is_empty());
        dec.feed(b, |r| frames.push(r.map(<[u8]>::to_vec)));
        assert_eq!(frames, vec![Ok(sample_frame())]);
    }

    #[test]
    fn bad_checksum_then_resync() {
        let mut wire = encode_frame(&[0x92, 0x00]).unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        wire.extend(encode_frame(&sample_frame()).unwrap());
        let mut dec = FrameDecoder::new();
        let mut results = Vec::new();
        dec.feed(&wire, |r| results.push(r.map(<[u8]>::to_vec)));
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(RadioError::BadChecksum { .. })));
        assert!(results[1].is_ok());
    }

    #[test]
    fn zero_length_is_rejected() {
        let mut dec = FrameDecoder::new();
        let mut results = Vec::new();
        dec.feed(&[0x7E, 0x00, 0x00], |r| results.push(r.map(<[u8]>::to_vec)));
        assert_eq!(results, vec![Err(RadioError::BadLength(0))]);
    }

    #[test]
    fn parses_io_sample() {
        let s = parse_io_sample(&sample_frame()).unwrap();
        assert_eq!(s.address, 0x0013_A200_4052_2BAA);
        assert_eq!(s.analog[1], Some(0x225));
        assert_eq!(s.analog[0], None);
        assert_eq!(s.supply, Some(0x350));
    }

    #[test]
    fn rejects_other_frame_types_and_short_samples() {
        assert_eq!(
            parse_io_sample(&[0x90, 0x00]),
            Err(RadioError::UnsupportedFrame(0x90))
        );
        assert_eq!(parse_io_sample(&sample_frame()[..20]), Err(RadioError::Truncated));
        assert_eq!(parse_io_sample(&[]), Err(RadioError::Truncated));
    }
}
