//! Pull-based iteration over a streaming fetch.

use tickfetch_types::{Tick, TickfetchError};
use tokio_util::sync::CancellationToken;

use crate::stream::{FetchEvent, TickStream};

/// Advances through the ticks of a [`TickStream`] one at a time.
///
/// Once [`advance`](Self::advance) returns `false` the cursor is closed and
/// every later call returns `false` as well. A failure or cancellation that
/// closed the cursor is kept in [`last_error`](Self::last_error).
#[derive(Debug)]
pub struct TickCursor {
    stream: TickStream,
    token: CancellationToken,
    current: Option<Tick>,
    error: Option<TickfetchError>,
    closed: bool,
}

impl TickCursor {
    pub(crate) const fn new(stream: TickStream, token: CancellationToken) -> Self {
        Self {
            stream,
            token,
            current: None,
            error: None,
            closed: false,
        }
    }

    /// Moves to the next tick, waiting for one if necessary.
    ///
    /// Returns `false` when the fetch has finished, failed, or the token was
    /// cancelled.
    pub async fn advance(&mut self) -> bool {
        if self.closed {
            return false;
        }

        let event = tokio::select! {
            biased;
            () = self.token.cancelled() => FetchEvent::Error(TickfetchError::Cancelled),
            event = self.stream.recv() => event.unwrap_or(FetchEvent::Done),
        };

        match event {
            FetchEvent::Tick(tick) => {
                self.current = Some(tick);
                true
            }
            FetchEvent::Done => self.close(None),
            FetchEvent::Error(e) => self.close(Some(e)),
        }
    }

    fn close(&mut self, error: Option<TickfetchError>) -> bool {
        self.closed = true;
        if error.is_some() {
            self.error = error;
        }
        false
    }

    /// The tick produced by the last successful [`advance`](Self::advance).
    ///
    /// Still holds that tick after the cursor closes.
    #[must_use]
    pub const fn current(&self) -> Option<&Tick> {
        self.current.as_ref()
    }

    /// The failure that closed the cursor, if any.
    #[must_use]
    pub const fn last_error(&self) -> Option<&TickfetchError> {
        self.error.as_ref()
    }

    /// Returns true once the cursor can no longer advance.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Cancels the underlying fetch.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}
