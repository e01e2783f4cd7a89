//! Datafeed URL construction.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Base URL for the Dukascopy data feed.
pub const BASE_URL: &str = "https://datafeed.dukascopy.com/datafeed";

/// Extension of the hourly tick files.
pub const TICK_FILE_EXTENSION: &str = "bi5";

/// Headers sent with every datafeed request.
pub const FEED_HEADERS: [(&str, &str); 7] = [
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:131.0) Gecko/20100101 Firefox/131.0",
    ),
    ("Accept", "/"),
    ("Accept-Encoding", "gzip, deflate"),
    ("Origin", "https://freeserv.dukascopy.com"),
    ("Connection", "keep-alive"),
    ("Referer", "https://freeserv.dukascopy.com/"),
    ("Cache-Control", "no-cache"),
];

/// Builds the URL for a specific hour's tick data.
///
/// URL format: `{base}/{SYMBOL}/{YEAR}/{MONTH}/{DAY}/{HOUR}h_ticks.bi5`
///
/// Note: the feed uses 0-indexed months (January = 00).
///
/// # Example
///
/// ```
/// use tickfetch_fetch::url::{BASE_URL, tick_url};
/// use chrono::{TimeZone, Utc};
///
/// let hour = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
/// let url = tick_url(BASE_URL, "btcusd", hour);
/// assert_eq!(url, "https://datafeed.dukascopy.com/datafeed/BTCUSD/2024/00/15/12h_ticks.bi5");
/// ```
#[must_use]
pub fn tick_url(base_url: &str, symbol: &str, hour: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}/{:02}/{:02}/{:02}h_ticks.{}",
        base_url.trim_end_matches('/'),
        symbol.to_uppercase(),
        hour.year(),
        hour.month0(),
        hour.day(),
        hour.hour(),
        TICK_FILE_EXTENSION,
    )
}
