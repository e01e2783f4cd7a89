//! Fetch orchestration: bounded-concurrency download and decode of hour slots.

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use std::pin::{Pin, pin};
use std::task::{Context, Poll};
use tickfetch_types::{Result, Tick, TickfetchError, floor_to_hour};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cursor::TickCursor;
use crate::decode::decode_ticks;
use crate::request::FetchRequest;
use crate::transport::{TransportError, TransportRequest};
use crate::url::{FEED_HEADERS, tick_url};

/// The ticks decoded from a single hour slot.
#[derive(Debug, Clone)]
pub struct TickBatch {
    /// The hour start timestamp.
    pub hour: DateTime<Utc>,
    /// The ticks in this batch, in decode order.
    pub ticks: Vec<Tick>,
}

impl TickBatch {
    /// Creates a new tick batch.
    #[must_use]
    pub const fn new(hour: DateTime<Utc>, ticks: Vec<Tick>) -> Self {
        Self { hour, ticks }
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Returns the number of ticks in the batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.ticks.len()
    }
}

/// Event emitted by [`stream_ticks`].
#[derive(Debug)]
pub enum FetchEvent {
    /// A decoded tick.
    Tick(Tick),
    /// Every slot finished successfully. No further events follow.
    Done,
    /// The run failed or was cancelled. No further events follow.
    Error(TickfetchError),
}

/// Creates a stream of tick batches, one per hour slot of `request`.
///
/// At most `request.concurrency()` slots are in flight at once; batches are
/// yielded in completion order, not slot order. Each slot is fetched through
/// the request's transport, decoded on the blocking pool and clipped to the
/// requested range.
pub fn slot_batches(request: &FetchRequest) -> impl Stream<Item = Result<TickBatch>> + '_ {
    stream::iter(request.slots())
        .map(move |hour| fetch_slot(request, hour))
        .buffer_unordered(request.concurrency())
}

async fn fetch_slot(request: &FetchRequest, hour: DateTime<Utc>) -> Result<TickBatch> {
    let symbol = request.symbol();
    let url = tick_url(request.base_url(), symbol, hour);
    debug!(%symbol, %hour, %url, "fetching slot");

    let payload = download(request, &url)
        .await
        .map_err(|e| match e {
            TransportError::Cancelled { .. } => TickfetchError::Cancelled,
            other => TickfetchError::Transport {
                symbol: symbol.to_string(),
                slot: hour,
                message: other.to_string(),
            },
        })?;

    let owned_symbol = symbol.to_string();
    let ticks = tokio::task::spawn_blocking(move || decode_ticks(&payload, &owned_symbol, hour))
        .await
        .map_err(|e| TickfetchError::Decode {
            symbol: symbol.to_string(),
            slot: hour,
            message: format!("spawn_blocking failed: {e}"),
        })?
        .map_err(|e| TickfetchError::Decode {
            symbol: symbol.to_string(),
            slot: hour,
            message: e.to_string(),
        })?;

    let decoded = ticks.len();
    let ticks = clip_to_range(hour, ticks, request.start(), request.end());
    debug!(%symbol, %hour, decoded, kept = ticks.len(), "slot decoded");

    Ok(TickBatch::new(hour, ticks))
}

async fn download(
    request: &FetchRequest,
    url: &str,
) -> std::result::Result<bytes::Bytes, TransportError> {
    let transport_request = TransportRequest::builder(url)
        .headers(FEED_HEADERS)
        .max_retries(request.max_retries())
        .retry_delay(request.retry_delay())
        .cancellation(request.cancellation().clone())
        .build()?;

    Ok(request.transport().execute(&transport_request).await?.body)
}

/// Drops ticks outside `[start, end]` from the slots containing either bound.
///
/// Ticks in other slots are returned untouched. Both bounds are inclusive.
#[must_use]
pub fn clip_to_range(
    hour: DateTime<Utc>,
    mut ticks: Vec<Tick>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Tick> {
    if hour == floor_to_hour(start) {
        if let Some(start_nanos) = start.timestamp_nanos_opt() {
            ticks.retain(|tick| tick.timestamp >= start_nanos);
        }
    }
    if hour == floor_to_hour(end) {
        if let Some(end_nanos) = end.timestamp_nanos_opt() {
            ticks.retain(|tick| tick.timestamp <= end_nanos);
        }
    }
    ticks
}

/// Downloads every slot of `request` and returns the ticks sorted by timestamp.
///
/// The first failing slot aborts the run: in-flight slots are dropped and the
/// ticks collected so far are discarded. Ties in timestamp keep decode order.
///
/// # Errors
///
/// Returns the first slot's transport or decode error, or
/// [`TickfetchError::Cancelled`] if the request's token fires.
pub async fn fetch_ticks(request: &FetchRequest) -> Result<Vec<Tick>> {
    let token = request.cancellation();
    let mut batches = pin!(slot_batches(request));
    let mut ticks = Vec::new();

    info!(
        symbol = request.symbol(),
        slots = request.slots().len(),
        concurrency = request.concurrency(),
        "starting download"
    );

    loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => return Err(TickfetchError::Cancelled),
            next = batches.next() => next,
        };

        match next {
            Some(Ok(batch)) => ticks.extend(batch.ticks),
            Some(Err(e)) => {
                warn!(symbol = request.symbol(), error = %e, "download aborted");
                return Err(e);
            }
            None => break,
        }
    }

    ticks.sort_by_key(|tick| tick.timestamp);
    info!(symbol = request.symbol(), ticks = ticks.len(), "download complete");
    Ok(ticks)
}

/// Starts a streaming download of `request`.
///
/// A supervisory task forwards ticks as each slot completes (unordered across
/// slots) and finishes with exactly one [`FetchEvent::Done`] or
/// [`FetchEvent::Error`]. The first failing slot, or cancellation, ends the
/// run. Dropping the returned stream stops the download.
///
/// Must be called within a tokio runtime.
#[must_use]
pub fn stream_ticks(request: FetchRequest) -> TickStream {
    let (tx, rx) = mpsc::channel(request.buffer_size());
    let token = request.cancellation().clone();
    let handle = tokio::spawn(supervise(request, tx));
    TickStream {
        events: rx,
        token,
        handle: Some(handle),
    }
}

async fn supervise(request: FetchRequest, tx: mpsc::Sender<FetchEvent>) {
    let token = request.cancellation().clone();
    let mut batches = pin!(slot_batches(&request));
    let mut emitted = 0usize;

    info!(
        symbol = request.symbol(),
        slots = request.slots().len(),
        concurrency = request.concurrency(),
        "starting stream"
    );

    let terminal = loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => break FetchEvent::Error(TickfetchError::Cancelled),
            () = tx.closed() => {
                debug!(symbol = request.symbol(), "stream consumer dropped");
                return;
            }
            next = batches.next() => next,
        };

        match next {
            Some(Ok(batch)) => {
                emitted += batch.len();
                for tick in batch.ticks {
                    if tx.send(FetchEvent::Tick(tick)).await.is_err() {
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                warn!(symbol = request.symbol(), error = %e, "stream aborted");
                break FetchEvent::Error(e);
            }
            None => {
                info!(symbol = request.symbol(), ticks = emitted, "stream complete");
                break FetchEvent::Done;
            }
        }
    };

    let _ = tx.send(terminal).await;
}

/// Live output of [`stream_ticks`].
///
/// Yields [`FetchEvent`]s; ticks arrive before the single terminal event.
#[derive(Debug)]
pub struct TickStream {
    events: mpsc::Receiver<FetchEvent>,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickStream {
    #[cfg(test)]
    pub(crate) fn from_channel(
        events: mpsc::Receiver<FetchEvent>,
        token: CancellationToken,
    ) -> Self {
        Self {
            events,
            token,
            handle: None,
        }
    }

    /// Receives the next event, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<FetchEvent> {
        self.events.recv().await
    }

    /// Cancels the download.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wraps the stream in a pull-based cursor observing the request's token.
    #[must_use]
    pub fn into_cursor(self) -> TickCursor {
        let token = self.token.clone();
        TickCursor::new(self, token)
    }
}

impl Stream for TickStream {
    type Item = FetchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for TickStream {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FeedExecutor, bi5_payload};
    use crate::transport::RetryingTransport;
    use crate::url::BASE_URL;
    use chrono::{TimeDelta, TimeZone};
    use std::sync::Arc;
    use std::time::Duration;
    use tickfetch_types::RawTick;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
    }

    fn slot(i: i64) -> DateTime<Utc> {
        start() + TimeDelta::hours(i)
    }

    fn url(i: i64) -> String {
        tick_url(BASE_URL, "BTCUSD", slot(i))
    }

    fn records(offsets: &[i32]) -> Vec<u8> {
        let records: Vec<_> = offsets
            .iter()
            .map(|&ms| RawTick::new(ms, 42_000_000 + ms, 41_999_000 + ms, 1.0, 2.0))
            .collect();
        bi5_payload(&records)
    }

    fn request(executor: Arc<FeedExecutor>, hours: i64, concurrency: usize) -> FetchRequest {
        FetchRequest::builder()
            .symbol("BTCUSD")
            .start(start())
            .end(slot(hours))
            .concurrency(concurrency)
            .max_retries(0)
            .retry_delay(Duration::ZERO)
            .transport(RetryingTransport::from_arc(executor))
            .build()
            .unwrap()
    }

    fn tick_at(nanos: i64) -> Tick {
        Tick::new("BTCUSD", nanos, 1.0, 1.0, 0.0, 0.0)
    }

    #[test]
    fn test_tick_batch_new() {
        let batch = TickBatch::new(start(), vec![]);
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_clip_start_slot() {
        let range_start = start() + TimeDelta::minutes(30);
        let start_nanos = range_start.timestamp_nanos_opt().unwrap();
        let ticks = vec![tick_at(start_nanos - 1), tick_at(start_nanos), tick_at(start_nanos + 1)];

        let kept = clip_to_range(start(), ticks, range_start, slot(5));

        assert_eq!(kept, vec![tick_at(start_nanos), tick_at(start_nanos + 1)]);
    }

    #[test]
    fn test_clip_end_slot() {
        let range_end = slot(3) + TimeDelta::minutes(10);
        let end_nanos = range_end.timestamp_nanos_opt().unwrap();
        let ticks = vec![tick_at(end_nanos - 1), tick_at(end_nanos), tick_at(end_nanos + 1)];

        let kept = clip_to_range(slot(3), ticks, start(), range_end);

        assert_eq!(kept, vec![tick_at(end_nanos - 1), tick_at(end_nanos)]);
    }

    #[test]
    fn test_clip_single_slot_applies_both_bounds() {
        let range_start = start() + TimeDelta::minutes(10);
        let range_end = start() + TimeDelta::minutes(20);
        let ticks: Vec<_> = [5, 10, 15, 20, 25]
            .iter()
            .map(|m| tick_at((start() + TimeDelta::minutes(*m)).timestamp_nanos_opt().unwrap()))
            .collect();

        let kept = clip_to_range(start(), ticks, range_start, range_end);

        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_clip_inner_slot_untouched() {
        let ticks = vec![tick_at(0), tick_at(1)];
        let kept = clip_to_range(slot(2), ticks.clone(), start(), slot(5));
        assert_eq!(kept, ticks);
    }

    #[tokio::test]
    async fn test_fetch_two_slots_sorted() {
        let executor = Arc::new(
            FeedExecutor::new(Duration::ZERO)
                .route(url(0), Ok((200, records(&[300, 100, 200]))))
                .route(url(1), Ok((200, records(&[5, 10, 15])))),
        );

        let ticks = fetch_ticks(&request(executor.clone(), 2, 1)).await.unwrap();

        assert_eq!(ticks.len(), 6);
        assert_eq!(executor.calls(), 2);
        assert!(ticks.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(ticks.iter().all(|t| t.symbol == "BTCUSD"));
        assert_eq!(ticks[0].timestamp, start().timestamp_nanos_opt().unwrap() + 100_000_000);
    }

    #[tokio::test]
    async fn test_fetch_empty_range() {
        let executor = Arc::new(FeedExecutor::default());
        let request = FetchRequest::builder()
            .symbol("BTCUSD")
            .start(start())
            .end(start())
            .transport(RetryingTransport::from_arc(executor.clone()))
            .build()
            .unwrap();

        let ticks = fetch_ticks(&request).await.unwrap();

        assert!(ticks.is_empty());
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_respects_concurrency_limit() {
        let executor = Arc::new(FeedExecutor::new(Duration::from_millis(20)));

        let ticks = fetch_ticks(&request(executor.clone(), 12, 3)).await.unwrap();

        assert!(ticks.is_empty());
        assert_eq!(executor.calls(), 12);
        assert!(executor.peak_in_flight() <= 3);
        assert!(executor.peak_in_flight() >= 2);
    }

    #[tokio::test]
    async fn test_fetch_aborts_on_first_failure() {
        let executor = Arc::new(
            FeedExecutor::new(Duration::ZERO)
                .route(url(0), Ok((200, records(&[1, 2, 3]))))
                .route(url(1), Ok((500, Vec::new()))),
        );

        let err = fetch_ticks(&request(executor, 3, 1)).await.unwrap_err();

        match err {
            TickfetchError::Transport { symbol, slot: failed, message } => {
                assert_eq!(symbol, "BTCUSD");
                assert_eq!(failed, slot(1));
                assert!(message.contains("try 1"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_decode_error() {
        let executor = Arc::new(
            FeedExecutor::new(Duration::ZERO).route(url(0), Ok((200, vec![0x5d, 0x00]))),
        );

        let err = fetch_ticks(&request(executor, 1, 1)).await.unwrap_err();

        assert!(matches!(err, TickfetchError::Decode { ref symbol, .. } if symbol == "BTCUSD"));
    }

    #[tokio::test]
    async fn test_fetch_cancelled() {
        let executor = Arc::new(FeedExecutor::new(Duration::from_millis(50)));
        let token = CancellationToken::new();
        let request = FetchRequest::builder()
            .symbol("BTCUSD")
            .start(start())
            .end(slot(24))
            .concurrency(2)
            .cancellation(token.clone())
            .transport(RetryingTransport::from_arc(executor.clone()))
            .build()
            .unwrap();

        token.cancel();
        let err = fetch_ticks(&request).await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(executor.calls() < 24);
    }

    #[tokio::test]
    async fn test_stream_emits_ticks_then_done() {
        let executor = Arc::new(
            FeedExecutor::new(Duration::ZERO)
                .route(url(0), Ok((200, records(&[1, 2, 3]))))
                .route(url(1), Ok((200, records(&[4, 5])))),
        );

        let mut stream = stream_ticks(request(executor, 2, 2));
        let mut ticks = Vec::new();
        let terminal = loop {
            match stream.recv().await {
                Some(FetchEvent::Tick(tick)) => ticks.push(tick),
                other => break other,
            }
        };

        assert!(matches!(terminal, Some(FetchEvent::Done)));
        assert_eq!(ticks.len(), 5);
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_reports_error_and_closes() {
        let executor = Arc::new(
            FeedExecutor::new(Duration::ZERO).route(url(0), Err("connection refused".to_string())),
        );

        let events: Vec<_> = stream_ticks(request(executor, 1, 1)).collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], FetchEvent::Error(TickfetchError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_stream_cancel() {
        let executor = Arc::new(FeedExecutor::new(Duration::from_millis(100)));
        let stream = stream_ticks(request(executor, 48, 2));
        stream.cancel();

        let events: Vec<_> = stream.collect().await;

        assert!(matches!(
            events.last(),
            Some(FetchEvent::Error(TickfetchError::Cancelled))
        ));
    }
}
