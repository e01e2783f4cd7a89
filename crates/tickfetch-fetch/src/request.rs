//! Fetch configuration.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tickfetch_types::{HourSlots, ValidationError, hour_slots};
use tokio_util::sync::CancellationToken;

use crate::RetryingTransport;
use crate::url::BASE_URL;

/// Minimum accepted symbol length.
pub const MIN_SYMBOL_LEN: usize = 3;

/// Default number of retries after the first attempt for each slot.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default delay between attempts for each slot.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(15);

/// Default capacity of the streaming channel.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// A validated download of one symbol over one time range.
///
/// Built once with [`FetchRequest::builder`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    symbol: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    concurrency: usize,
    transport: RetryingTransport,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    buffer_size: usize,
    cancellation: CancellationToken,
}

impl FetchRequest {
    /// Returns a fresh builder with default settings.
    #[must_use]
    pub fn builder() -> FetchRequestBuilder {
        FetchRequestBuilder::default()
    }

    /// Returns the instrument symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the requested start instant.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the requested end instant.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the maximum number of slots fetched concurrently.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the transport used for every slot.
    #[must_use]
    pub const fn transport(&self) -> &RetryingTransport {
        &self.transport
    }

    /// Returns the datafeed base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the number of retries per slot.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Returns the streaming channel capacity.
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Returns the token that cancels this fetch.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns the hour slots this request covers, as of now.
    #[must_use]
    pub fn slots(&self) -> HourSlots {
        hour_slots(self.start, self.end)
    }
}

/// Builder for [`FetchRequest`].
#[derive(Debug)]
pub struct FetchRequestBuilder {
    symbol: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    concurrency: usize,
    transport: Option<RetryingTransport>,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    buffer_size: usize,
    cancellation: CancellationToken,
}

impl Default for FetchRequestBuilder {
    fn default() -> Self {
        Self {
            symbol: None,
            start: None,
            end: None,
            concurrency: 1,
            transport: None,
            base_url: BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            buffer_size: DEFAULT_BUFFER_SIZE,
            cancellation: CancellationToken::new(),
        }
    }
}

impl FetchRequestBuilder {
    /// Sets the instrument symbol (e.g. `BTCUSD`).
    #[must_use]
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Sets the start of the range (inclusive).
    #[must_use]
    pub const fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the end of the range.
    #[must_use]
    pub const fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Sets the maximum number of slots fetched concurrently.
    #[must_use]
    pub const fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the transport.
    #[must_use]
    pub fn transport(mut self, transport: RetryingTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Overrides the datafeed base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the number of retries per slot.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the fixed delay between attempts.
    #[must_use]
    pub const fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sets the streaming channel capacity. Zero is raised to one.
    #[must_use]
    pub const fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Sets the token that cancels the whole fetch.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is shorter than [`MIN_SYMBOL_LEN`],
    /// concurrency is zero, the transport or either bound is missing, or the
    /// end precedes the start.
    pub fn build(self) -> Result<FetchRequest, ValidationError> {
        let symbol = self.symbol.unwrap_or_default();
        if symbol.trim().chars().count() < MIN_SYMBOL_LEN {
            return Err(ValidationError::Symbol(symbol));
        }
        if self.concurrency == 0 {
            return Err(ValidationError::Concurrency);
        }
        let transport = self.transport.ok_or(ValidationError::Missing("transport"))?;
        let start = self.start.ok_or(ValidationError::Missing("start"))?;
        let end = self.end.ok_or(ValidationError::Missing("end"))?;
        if end < start {
            return Err(ValidationError::InvalidRange { start, end });
        }

        Ok(FetchRequest {
            symbol,
            start,
            end,
            concurrency: self.concurrency,
            transport,
            base_url: self.base_url,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
            buffer_size: self.buffer_size.max(1),
            cancellation: self.cancellation,
        })
    }
}
