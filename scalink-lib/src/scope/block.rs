//! SCPI definite-length block data: `#<d><len><payload>`.
//!
//! `<d>` is one ASCII digit giving the width of `<len>`, `<len>` is the
//! payload byte count in ASCII decimal. In `WORD` waveform format each sample
//! is two payload bytes, little-endian two's complement.

use crate::{Error, Result};

pub const START_OF_FRAME: u8 = b'#';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    MissingStart,
    /// The header or payload is cut short; `needed` is the full frame length if known.
    Incomplete { needed: Option<usize>, available: usize },
    InvalidDigitCount(u8),
    InvalidLength(Vec<u8>),
    OddLength(usize),
}

impl From<BlockError> for Error {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::MissingStart => Error::frame("start of frame '#' not found"),
            BlockError::Incomplete {
                needed: Some(needed),
                available,
            } => Error::frame(format!(
                "truncated block, need {} bytes but only {} available",
                needed, available
            )),
            BlockError::Incomplete {
                needed: None,
                available,
            } => Error::frame(format!("truncated block header ({} bytes)", available)),
            BlockError::InvalidDigitCount(b) => {
                Error::frame(format!("invalid header digit count {:#04X}", b))
            }
            BlockError::InvalidLength(raw) => Error::frame(format!(
                "invalid payload length field {:?}",
                String::from_utf8_lossy(&raw)
            )),
            BlockError::OddLength(len) => Error::frame(format!(
                "payload length {} is odd, samples are two bytes each",
                len
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformBlock<'a> {
    pub header_digits: usize,
    pub payload: &'a [u8],
    /// Index one past the last payload byte in the raw buffer.
    pub end: usize,
}

impl<'a> WaveformBlock<'a> {
    pub fn parse(raw: &'a [u8]) -> std::result::Result<Self, BlockError> {
        let start = raw
            .iter()
            .position(|&b| b == START_OF_FRAME)
            .ok_or(BlockError::MissingStart)?;

        let incomplete = |needed| BlockError::Incomplete {
            needed,
            available: raw.len(),
        };

        let digit = *raw.get(start + 1).ok_or_else(|| incomplete(None))?;
        if !(b'1'..=b'9').contains(&digit) {
            return Err(BlockError::InvalidDigitCount(digit));
        }
        let header_digits = (digit - b'0') as usize;

        let len_start = start + 2;
        let len_end = len_start + header_digits;
        let len_field = raw.get(len_start..len_end).ok_or_else(|| incomplete(None))?;
        let payload_len = std::str::from_utf8(len_field)
            .ok()
            .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| BlockError::InvalidLength(len_field.to_vec()))?;

        if payload_len % 2 != 0 {
            return Err(BlockError::OddLength(payload_len));
        }

        let end = len_end + payload_len;
        let payload = raw.get(len_end..end).ok_or_else(|| incomplete(Some(end)))?;

        Ok(Self {
            header_digits,
            payload,
            end,
        })
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    pub fn samples(&self) -> Vec<i16> {
        self.payload
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}

/// Decode a raw instrument reply into signed samples.
pub fn decode_samples(raw: &[u8]) -> Result<Vec<i16>> {
    let block = WaveformBlock::parse(raw)?;
    Ok(block.samples())
}

/// Build a block with the shortest header that fits the payload.
pub fn encode_samples(samples: &[i16]) -> Vec<u8> {
    let payload: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    encode_block(&payload)
}

pub fn encode_block(payload: &[u8]) -> Vec<u8> {
    let len = payload.len().to_string();
    let mut out = Vec::with_capacity(2 + len.len() + payload.len());
    out.push(START_OF_FRAME);
    out.push(b'0' + len.len() as u8);
    out.extend_from_slice(len.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// Length of the complete frame in `raw`, for readers receiving it in pieces.
pub fn framed_len(raw: &[u8]) -> std::result::Result<usize, BlockError> {
    WaveformBlock::parse(raw).map(|block| block.end)
}
