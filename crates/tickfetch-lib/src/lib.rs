//! Rust library for downloading Dukascopy hourly tick data.
//!
//! This is a facade crate that re-exports functionality from the tickfetch
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use tickfetch_lib::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = FetchRequest::builder()
//!         .symbol("EURUSD")
//!         .start(Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap())
//!         .end(Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap())
//!         .concurrency(4)
//!         .transport(RetryingTransport::with_defaults()?)
//!         .build()?;
//!
//!     let mut cursor = stream_ticks(request).into_cursor();
//!     while cursor.advance().await {
//!         if let Some(tick) = cursor.current() {
//!             println!("{} {} {}", tick.timestamp, tick.bid, tick.ask);
//!         }
//!     }
//!     if let Some(err) = cursor.last_error() {
//!         eprintln!("fetch failed: {err}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/tickfetch/tickfetch/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use tickfetch_types::*;

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use tickfetch_fetch::{
    AttemptHistory, AttemptRecord, ClientConfig, DecodeError, FetchEvent, FetchRequest,
    FetchRequestBuilder, HttpError, HttpExecutor, HttpRequest, HttpResponse, ReqwestExecutor,
    RetryPredicate, RetryingTransport, TickBatch, TickCursor, TickStream, TransportError,
    TransportRequest, TransportRequestBuilder, clip_to_range, decode_ticks, decompress_bi5,
    fetch_ticks, parse_ticks, retry_unless_ok, slot_batches, stream_ticks, url,
};

// Re-export formatters
#[cfg(feature = "format")]
pub use tickfetch_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat,
};

/// Prelude module for convenient imports.
///
/// ```
/// use tickfetch_lib::prelude::*;
/// ```
pub mod prelude {
    pub use tickfetch_types::{
        HourSlots, RawTick, Result, Tick, TickfetchError, ValidationError, hour_slots,
    };

    #[cfg(feature = "fetch")]
    pub use tickfetch_fetch::{
        ClientConfig, FetchEvent, FetchRequest, RetryingTransport, TickCursor, TickStream,
        fetch_ticks, stream_ticks,
    };

    #[cfg(feature = "format")]
    pub use tickfetch_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};
}
