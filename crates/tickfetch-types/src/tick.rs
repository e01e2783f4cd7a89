//! Tick data representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Divisor applied to the fixed-point prices stored in bi5 records.
pub const PRICE_SCALE: f64 = 1000.0;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// A single decoded price update.
///
/// Serializes as a flat record of named fields, so it can be handed to any
/// tabular writer without further mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Instrument identifier as requested by the caller.
    pub symbol: String,
    /// Nanoseconds since the Unix epoch (UTC).
    pub timestamp: i64,
    /// Ask (offer) price.
    pub ask: f64,
    /// Bid price.
    pub bid: f64,
    /// Volume available at the ask price.
    pub volume_ask: f64,
    /// Volume available at the bid price.
    pub volume_bid: f64,
}

impl Tick {
    /// Creates a new tick.
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        timestamp: i64,
        ask: f64,
        bid: f64,
        volume_ask: f64,
        volume_bid: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            ask,
            bid,
            volume_ask,
            volume_bid,
        }
    }

    /// Returns the timestamp as a UTC date-time.
    #[must_use]
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.timestamp)
    }

    /// Returns the mid price (average of ask and bid).
    #[must_use]
    pub fn mid(&self) -> f64 {
        (self.ask + self.bid) / 2.0
    }

    /// Returns the spread (ask - bid).
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

/// Raw tick as read from a bi5 record, before timestamp and price reconstruction.
///
/// The bi5 format stores ticks as 20 bytes in big-endian order:
/// - `i32`: milliseconds offset from hour start
/// - `i32`: ask price, fixed point (scaled by [`PRICE_SCALE`])
/// - `i32`: bid price, fixed point (scaled by [`PRICE_SCALE`])
/// - `f32`: ask volume
/// - `f32`: bid volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTick {
    /// Milliseconds offset from the hour start.
    pub ms_offset: i32,
    /// Fixed-point ask price.
    pub ask_raw: i32,
    /// Fixed-point bid price.
    pub bid_raw: i32,
    /// Ask volume.
    pub ask_volume: f32,
    /// Bid volume.
    pub bid_volume: f32,
}

impl RawTick {
    /// Size in bytes of a raw tick record.
    pub const SIZE: usize = 20;

    /// Creates a new raw tick.
    #[must_use]
    pub const fn new(
        ms_offset: i32,
        ask_raw: i32,
        bid_raw: i32,
        ask_volume: f32,
        bid_volume: f32,
    ) -> Self {
        Self {
            ms_offset,
            ask_raw,
            bid_raw,
            ask_volume,
            bid_volume,
        }
    }

    /// Builds a [`Tick`] anchored at `hour_start_nanos` (UTC nanoseconds of the slot start).
    #[must_use]
    pub fn normalize(self, symbol: &str, hour_start_nanos: i64) -> Tick {
        Tick {
            symbol: symbol.to_string(),
            timestamp: hour_start_nanos + i64::from(self.ms_offset) * NANOS_PER_MILLI,
            ask: f64::from(self.ask_raw) / PRICE_SCALE,
            bid: f64::from(self.bid_raw) / PRICE_SCALE,
            volume_ask: f64::from(self.ask_volume),
            volume_bid: f64::from(self.bid_volume),
        }
    }
}
