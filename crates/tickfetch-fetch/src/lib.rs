//! HTTP transport and tick fetching for the tickfetch downloader.
//!
//! This crate provides the download pipeline:
//!
//! - [`url::tick_url`] - Constructs datafeed URLs for one hour slot
//! - [`RetryingTransport`] - Fixed-delay retrying HTTP transport over an [`HttpExecutor`]
//! - [`decode_ticks`] - LZMA decompression and record parsing of bi5 payloads
//! - [`fetch_ticks`] - Bounded-concurrency download into a sorted tick vector
//! - [`stream_ticks`] - Streaming download with a pull-based [`TickCursor`]

#![doc(issue_tracker_base_url = "https://github.com/tickfetch/tickfetch/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cursor;
mod decode;
mod request;
mod stream;
mod transport;
pub mod url;

#[cfg(test)]
mod testing;

pub use cursor::TickCursor;
pub use decode::{DecodeError, decode_ticks, decompress_bi5, parse_ticks, tick_count};
pub use request::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, FetchRequest,
    FetchRequestBuilder, MIN_SYMBOL_LEN,
};
pub use stream::{
    FetchEvent, TickBatch, TickStream, clip_to_range, fetch_ticks, slot_batches, stream_ticks,
};
pub use transport::{
    AttemptHistory, AttemptRecord, ClientConfig, HttpError, HttpExecutor, HttpRequest,
    HttpResponse, ReqwestExecutor, RetryPredicate, RetryingTransport, TransportError,
    TransportRequest, TransportRequestBuilder, retry_unless_ok,
};
