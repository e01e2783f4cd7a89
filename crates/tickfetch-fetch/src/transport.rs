//! Retrying HTTP transport.
//!
//! [`RetryingTransport`] wraps an [`HttpExecutor`] in a uniform retry envelope:
//! a bounded number of attempts, a fixed delay between them, a caller-supplied
//! retry predicate and cooperative cancellation through a [`CancellationToken`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for the reqwest-backed HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout (separate from request timeout).
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 10,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("tickfetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A single HTTP call handed to an [`HttpExecutor`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Target URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

/// Response returned by an [`HttpExecutor`].
///
/// The body has already been stripped of any `Content-Encoding`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded response body.
    pub body: Bytes,
}

/// Error raised by a single HTTP call.
#[derive(Error, Debug)]
pub enum HttpError {
    /// reqwest failed to send the request or read the body.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Any other executor failure.
    #[error("{0}")]
    Other(String),
}

/// Capability to execute one HTTP call.
#[async_trait]
pub trait HttpExecutor: Send + Sync + fmt::Debug {
    /// Sends `request` and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns an error if the call could not be completed.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// [`HttpExecutor`] backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Creates an executor with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decides, from the outcome of an attempt, whether another attempt is wanted.
pub type RetryPredicate = Arc<dyn Fn(&Result<HttpResponse, HttpError>) -> bool + Send + Sync>;

/// Default retry predicate: retry on transport errors and any status other than 200.
#[must_use]
pub fn retry_unless_ok(result: &Result<HttpResponse, HttpError>) -> bool {
    !matches!(result, Ok(response) if response.status == StatusCode::OK)
}

/// Errors produced by [`RetryingTransport`].
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request configuration is invalid. No attempt was made.
    #[error("invalid transport request: {0}")]
    Validation(String),

    /// The cancellation token fired before an attempt.
    #[error("request to {url} cancelled after {attempts} attempts")]
    Cancelled {
        /// Target URL.
        url: String,
        /// Attempts made before cancellation was observed.
        attempts: usize,
    },

    /// Every attempt failed or asked for a retry.
    #[error("max retries exceeded for {url}; {history}")]
    RetriesExhausted {
        /// Target URL.
        url: String,
        /// Outcome of every attempt.
        history: AttemptHistory,
    },
}

/// Outcome of a single attempt, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// One-based attempt number.
    pub attempt: u32,
    /// Response status, when a response was received.
    pub status: Option<u16>,
    /// Transport error, when the call failed.
    pub error: Option<String>,
    /// Verdict of the retry predicate.
    pub retry: bool,
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "try {}: ", self.attempt)?;
        match (&self.status, &self.error) {
            (_, Some(error)) => write!(f, "{error}")?,
            (Some(status), None) => write!(f, "status {status}")?,
            (None, None) => write!(f, "no response")?,
        }
        write!(f, "; retry condition status: {}", self.retry)
    }
}

/// Every attempt made for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptHistory(pub Vec<AttemptRecord>);

impl AttemptHistory {
    /// Number of attempts made.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no attempt was made.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AttemptHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} attempts", self.0.len())?;
        for record in &self.0 {
            write!(f, "\n\t\t{record}")?;
        }
        Ok(())
    }
}

/// A validated request, ready for [`RetryingTransport::execute`].
#[derive(Clone)]
pub struct TransportRequest {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
    max_retries: u32,
    retry_delay: Duration,
    retry_predicate: RetryPredicate,
    cancellation: CancellationToken,
}

impl TransportRequest {
    /// Starts a new request for `url` with no retries and no delay.
    #[must_use]
    pub fn builder(url: impl Into<String>) -> TransportRequestBuilder {
        TransportRequestBuilder::new(url.into())
    }

    /// Returns the target URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the maximum number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TransportRequest`]. Validation happens once, in [`build`](Self::build).
pub struct TransportRequestBuilder {
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    body: Bytes,
    max_retries: u32,
    retry_delay: Duration,
    retry_predicate: RetryPredicate,
    cancellation: CancellationToken,
}

impl TransportRequestBuilder {
    fn new(url: String) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: Vec::new(),
            body: Bytes::new(),
            max_retries: 0,
            retry_delay: Duration::ZERO,
            retry_predicate: Arc::new(retry_unless_ok),
            cancellation: CancellationToken::new(),
        }
    }

    /// Sets the request method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header. A later value for the same name replaces the earlier one.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several headers.
    #[must_use]
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the request body. The buffer is re-sent on every attempt.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the number of retries after the first attempt.
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

    /// Sets the retry predicate. Defaults to [`retry_unless_ok`].
    #[must_use]
    pub fn retry_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Result<HttpResponse, HttpError>) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Arc::new(predicate);
        self
    }

    /// Sets the cancellation token checked before every attempt.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Validates the configuration and builds the request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Validation`] if the URL is malformed or not
    /// `http`/`https`, or if a header name or value is invalid.
    pub fn build(self) -> Result<TransportRequest, TransportError> {
        let url = Url::parse(&self.url)
            .map_err(|e| TransportError::Validation(format!("invalid url '{}': {e}", self.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::Validation(format!(
                "unsupported url scheme '{}' in '{}'",
                url.scheme(),
                self.url
            )));
        }

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Validation(format!("invalid header '{name}': {e}")))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::Validation(format!("invalid value for header '{name}': {e}"))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(TransportRequest {
            url,
            method: self.method,
            headers,
            body: self.body,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
            retry_predicate: self.retry_predicate,
            cancellation: self.cancellation,
        })
    }
}

impl fmt::Debug for TransportRequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequestBuilder")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

/// HTTP transport with bounded, fixed-delay retries.
#[derive(Debug, Clone)]
pub struct RetryingTransport {
    executor: Arc<dyn HttpExecutor>,
}

impl RetryingTransport {
    /// Creates a transport over the given executor.
    #[must_use]
    pub fn new(executor: impl HttpExecutor + 'static) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    /// Creates a transport over a shared executor.
    #[must_use]
    pub fn from_arc(executor: Arc<dyn HttpExecutor>) -> Self {
        Self { executor }
    }

    /// Creates a reqwest-backed transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn reqwest(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(ReqwestExecutor::new(config)?))
    }

    /// Creates a reqwest-backed transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::reqwest(&ClientConfig::default())
    }

    /// Executes `request`, retrying as configured.
    ///
    /// Makes at most `max_retries + 1` attempts. The cancellation token is
    /// checked before each one; the delay between attempts is not interrupted
    /// by cancellation, but no attempt follows it once the token has fired.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Cancelled`] if the token fired, or
    /// [`TransportError::RetriesExhausted`] with every attempt's outcome.
    pub async fn execute(&self, request: &TransportRequest) -> Result<HttpResponse, TransportError> {
        let total = request.max_retries.saturating_add(1);
        let mut history = Vec::new();

        for attempt in 1..=total {
            if attempt > 1 {
                tokio::time::sleep(request.retry_delay).await;
            }

            if request.cancellation.is_cancelled() {
                debug!(url = %request.url, attempt, "request cancelled");
                return Err(TransportError::Cancelled {
                    url: request.url.to_string(),
                    attempts: history.len(),
                });
            }

            let result = self.executor.execute(request.to_http()).await;
            let retry = (request.retry_predicate)(&result);

            let record = match result {
                Ok(response) if !retry => {
                    debug!(url = %request.url, attempt, status = %response.status, "request succeeded");
                    return Ok(response);
                }
                Ok(response) => AttemptRecord {
                    attempt,
                    status: Some(response.status.as_u16()),
                    error: None,
                    retry,
                },
                Err(e) => AttemptRecord {
                    attempt,
                    status: None,
                    error: Some(e.to_string()),
                    retry,
                },
            };

            if attempt < total {
                warn!(
                    url = %request.url,
                    attempt,
                    remaining = total - attempt,
                    delay_ms = request.retry_delay.as_millis() as u64,
                    outcome = %record,
                    "retrying request"
                );
            }
            history.push(record);
        }

        Err(TransportError::RetriesExhausted {
            url: request.url.to_string(),
            history: AttemptHistory(history),
        })
    }
}
