//! Slots command implementation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tickfetch_lib::hour_slots;
use tickfetch_lib::url::tick_url;

/// Print the URL of every hour slot covering `[start, end)`.
pub(crate) fn slots(
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    base_url: &str,
) -> Result<()> {
    if end < start {
        anyhow::bail!("End {end} is before start {start}");
    }

    for hour in hour_slots(start, end) {
        println!("{}", tick_url(base_url, symbol, hour));
    }

    Ok(())
}
