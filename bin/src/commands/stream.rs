//! Stream command implementation.

use crate::FetchArgs;
use crate::commands::download::{build_request, cancel_on_ctrl_c};
use anyhow::{Context, Result, bail};
use std::io::Write;
use tickfetch_lib::prelude::*;
use tokio_util::sync::CancellationToken;

/// Print ticks to stdout as NDJSON in arrival order.
pub(crate) async fn stream(symbol: &str, args: &FetchArgs) -> Result<()> {
    let token = CancellationToken::new();
    let request = build_request(symbol, args, token.clone())?;
    cancel_on_ctrl_c(token);

    let mut cursor = stream_ticks(request).into_cursor();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut count = 0usize;

    while cursor.advance().await {
        if let Some(tick) = cursor.current() {
            JsonFormatter::write_line(tick, &mut out).context("Failed to write tick")?;
            count += 1;
        }
    }
    out.flush()?;

    if let Some(err) = cursor.last_error() {
        bail!("Streaming {symbol} stopped after {count} ticks: {err}");
    }

    tracing::info!(symbol, ticks = count, "stream finished");
    Ok(())
}
