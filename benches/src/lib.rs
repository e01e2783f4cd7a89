//! Benchmark fixtures for tickfetch.

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, TimeZone, Utc};
use std::io::Cursor;

/// Size of one uncompressed bi5 record in bytes.
pub const RECORD_SIZE: usize = 20;

/// Hour slot used by every fixture.
pub fn fixture_hour() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 14, 0, 0).unwrap()
}

/// Builds `count` uncompressed records spread evenly over one hour.
///
/// Prices follow a small deterministic walk so that the compressed size
/// resembles a real hour of quotes.
pub fn synthetic_records(count: usize) -> Vec<u8> {
    let mut raw = Vec::with_capacity(count * RECORD_SIZE);
    let step = (3_600_000 / count.max(1)) as i32;
    let mut bid = 110_000i32;

    for i in 0..count {
        bid += [1, -1, 0, 2, -2][i % 5];
        write_record(&mut raw, i as i32 * step, bid + 2, bid).expect("write to Vec");
    }
    raw
}

fn write_record(raw: &mut Vec<u8>, ms: i32, ask: i32, bid: i32) -> std::io::Result<()> {
    raw.write_i32::<BigEndian>(ms)?;
    raw.write_i32::<BigEndian>(ask)?;
    raw.write_i32::<BigEndian>(bid)?;
    raw.write_f32::<BigEndian>(1.5)?;
    raw.write_f32::<BigEndian>(2.25)
}

/// LZMA-compresses records into a bi5 payload.
pub fn compress(records: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    lzma_rs::lzma_compress(&mut Cursor::new(records), &mut payload).expect("compress into Vec");
    payload
}

/// Builds a compressed hour of `count` synthetic ticks.
pub fn synthetic_payload(count: usize) -> Vec<u8> {
    compress(&synthetic_records(count))
}
