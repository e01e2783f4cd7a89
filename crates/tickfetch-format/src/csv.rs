//! Delimited text output format.

use chrono::SecondsFormat;
use std::io::Write;
use tickfetch_types::Tick;

use crate::{FormatError, Formatter};

/// Delimited text formatter.
///
/// Columns: `symbol`, `timestamp` (Unix nanoseconds), `date` (RFC 3339),
/// `ask`, `bid`, `volume_ask`, `volume_bid`.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    delimiter: char,
    include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    /// Creates a comma-separated formatter with a header row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Creates a tab-separated values (TSV) formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self::new().with_delimiter('\t')
    }

    /// Returns the field delimiter.
    #[must_use]
    pub const fn delimiter(&self) -> char {
        self.delimiter
    }
}

impl Formatter for CsvFormatter {
    fn write_ticks<W: Write + Send>(
        &self,
        ticks: &[Tick],
        mut writer: W,
    ) -> Result<(), FormatError> {
        let d = self.delimiter;

        if self.include_header {
            writeln!(
                writer,
                "symbol{d}timestamp{d}date{d}ask{d}bid{d}volume_ask{d}volume_bid"
            )?;
        }

        for tick in ticks {
            writeln!(
                writer,
                "{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
                tick.symbol,
                tick.timestamp,
                tick.datetime().to_rfc3339_opts(SecondsFormat::Millis, true),
                tick.ask,
                tick.bid,
                tick.volume_ask,
                tick.volume_bid
            )?;
        }

        writer.flush()?;
        Ok(())
    }

    fn extension(&self) -> &str {
        if self.delimiter == '\t' { "tsv" } else { "csv" }
    }
}
