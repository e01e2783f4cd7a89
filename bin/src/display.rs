//! Argument parsing and output formatting for the tickfetch CLI.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::ValueEnum;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;
use tickfetch_lib::prelude::*;

/// Output format for downloaded data.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Json,
    Ndjson,
}

impl Format {
    /// Returns the file extension for this format.
    pub(crate) const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A UTC instant given on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DateArg(pub(crate) DateTime<Utc>);

impl FromStr for DateArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(&format!("{s}:00:00"), "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self(dt.and_utc()));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self(date.and_time(chrono::NaiveTime::MIN).and_utc()));
        }
        Err(format!(
            "invalid date '{s}': expected RFC 3339, YYYY-MM-DD or YYYY-MM-DDTHH"
        ))
    }
}

impl From<DateArg> for DateTime<Utc> {
    fn from(arg: DateArg) -> Self {
        arg.0
    }
}

/// Write ticks to a file in the specified format.
pub(crate) fn write_ticks(
    ticks: &[Tick],
    output: &Path,
    format: Format,
    delimiter: char,
) -> Result<()> {
    let file = File::create(output)?;
    let writer = BufWriter::new(file);

    match format {
        Format::Csv => {
            let formatter = CsvFormatter::new().with_delimiter(delimiter);
            formatter.write_ticks(ticks, writer)?;
        }
        Format::Json => {
            let formatter = JsonFormatter::new();
            formatter.write_ticks(ticks, writer)?;
        }
        Format::Ndjson => {
            let formatter = JsonFormatter::ndjson();
            formatter.write_ticks(ticks, writer)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339() {
        let arg: DateArg = "2024-03-01T09:15:00+01:00".parse().unwrap();
        assert_eq!(arg.0, Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only() {
        let arg: DateArg = "2024-03-01".parse().unwrap();
        assert_eq!(arg.0, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_hour() {
        let arg: DateArg = "2024-03-01T17".parse().unwrap();
        assert_eq!(arg.0, Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!("yesterday".parse::<DateArg>().is_err());
        assert!("2024-13-01".parse::<DateArg>().is_err());
    }

    #[test]
    fn test_write_semicolon_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticks.csv");
        let ticks = vec![Tick::new("EURUSD", 0, 1.1, 1.0, 1.0, 1.0)];

        write_ticks(&ticks, &path, Format::Csv, ';').unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("symbol;timestamp;"));
    }
}
