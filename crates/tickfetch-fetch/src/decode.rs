//! bi5 payload decoding.
//!
//! A payload is an LZMA stream of fixed 20-byte big-endian records. Decoding is
//! all-or-nothing: a corrupt stream or a truncated trailing record rejects the
//! whole payload.

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use lzma_rs::lzma_decompress;
use std::io::{BufReader, Cursor};
use thiserror::Error;
use tickfetch_types::{RawTick, Tick};

/// Errors that can occur while decoding a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// LZMA decompression failed.
    #[error("LZMA decompression failed: {0}")]
    Lzma(String),

    /// Empty input data.
    #[error("Empty input data")]
    EmptyInput,

    /// Decompressed length is not a whole number of records.
    #[error("Invalid data length: {0} bytes (expected multiple of {1})")]
    InvalidLength(usize, usize),

    /// The slot start cannot be expressed in nanoseconds.
    #[error("Slot start {0} is outside the nanosecond timestamp range")]
    SlotOutOfRange(DateTime<Utc>),
}

/// Decompresses LZMA-compressed bi5 data.
///
/// # Errors
///
/// Returns an error if the input is empty or not a valid LZMA stream.
pub fn decompress_bi5(compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if compressed.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let mut decompressed = Vec::new();
    let mut reader = BufReader::new(Cursor::new(compressed));

    lzma_decompress(&mut reader, &mut decompressed)
        .map_err(|e| DecodeError::Lzma(e.to_string()))?;

    Ok(decompressed)
}

/// Parses raw ticks from decompressed bi5 data.
///
/// # Errors
///
/// Returns an error if the data length is not a multiple of [`RawTick::SIZE`].
pub fn parse_ticks(data: &[u8]) -> Result<impl Iterator<Item = RawTick> + '_, DecodeError> {
    if !data.len().is_multiple_of(RawTick::SIZE) {
        return Err(DecodeError::InvalidLength(data.len(), RawTick::SIZE));
    }

    Ok(data.chunks_exact(RawTick::SIZE).map(parse_single_tick))
}

#[inline]
fn parse_single_tick(data: &[u8]) -> RawTick {
    RawTick::new(
        BigEndian::read_i32(&data[0..4]),
        BigEndian::read_i32(&data[4..8]),
        BigEndian::read_i32(&data[8..12]),
        BigEndian::read_f32(&data[12..16]),
        BigEndian::read_f32(&data[16..20]),
    )
}

/// Returns the number of whole records in `data_len` decompressed bytes.
#[must_use]
pub const fn tick_count(data_len: usize) -> usize {
    data_len / RawTick::SIZE
}

/// Decodes one hour's payload into ticks, in record order.
///
/// An empty payload means the feed has no ticks for that hour and decodes to
/// an empty vector.
///
/// # Errors
///
/// Returns an error if decompression or parsing fails.
pub fn decode_ticks(
    payload: &[u8],
    symbol: &str,
    hour: DateTime<Utc>,
) -> Result<Vec<Tick>, DecodeError> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }

    let hour_nanos = hour
        .timestamp_nanos_opt()
        .ok_or(DecodeError::SlotOutOfRange(hour))?;
    let decompressed = decompress_bi5(payload)?;

    Ok(parse_ticks(&decompressed)?
        .map(|raw| raw.normalize(symbol, hour_nanos))
        .collect())
}
