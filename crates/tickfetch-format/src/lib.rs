//! Output formatters for the tickfetch tick data downloader.
//!
//! This crate provides formatters for writing decoded ticks to various
//! output formats:
//!
//! - [`CsvFormatter`] - Delimited text (CSV, TSV, semicolon-separated)
//! - [`JsonFormatter`] - JSON array or NDJSON format

#![doc(issue_tracker_base_url = "https://github.com/tickfetch/tickfetch/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod csv;
mod formatter;
mod json;

pub use crate::csv::CsvFormatter;
pub use formatter::{FormatError, Formatter, OutputFormat};
pub use json::{JsonFormatter, JsonStyle};
