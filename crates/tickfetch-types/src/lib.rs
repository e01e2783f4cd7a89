//! Core types for the tickfetch tick data downloader.
//!
//! This crate provides the fundamental data structures used throughout tickfetch:
//!
//! - [`Tick`] - A decoded price tick with symbol, timestamp, ask, bid, and volumes
//! - [`RawTick`] - Raw tick from the bi5 binary format before reconstruction
//! - [`HourSlots`] - Hour-aligned slots covering a requested time range
//! - [`TickfetchError`] - Unified error type

#![doc(issue_tracker_base_url = "https://github.com/tickfetch/tickfetch/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod slots;
mod tick;

pub use error::{Result, TickfetchError, ValidationError};
pub use slots::{HourSlots, floor_to_hour, hour_slots};
pub use tick::{PRICE_SCALE, RawTick, Tick};
