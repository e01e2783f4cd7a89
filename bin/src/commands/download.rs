//! Download command implementation.
//!
//! This module downloads a symbol's ticks over a time range, sorts them and
//! writes them to a file in the requested format.

use crate::FetchArgs;
use crate::display::{Format, write_ticks};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tickfetch_lib::prelude::*;
use tokio_util::sync::CancellationToken;

/// Builds a validated request from the shared command-line options.
pub(crate) fn build_request(
    symbol: &str,
    args: &FetchArgs,
    token: CancellationToken,
) -> Result<FetchRequest> {
    let transport =
        RetryingTransport::with_defaults().context("Failed to create HTTP client")?;

    FetchRequest::builder()
        .symbol(symbol)
        .start(args.start.into())
        .end(args.end.into())
        .concurrency(args.concurrency)
        .max_retries(args.max_retries)
        .retry_delay(args.retry_delay())
        .base_url(args.base_url.clone())
        .cancellation(token)
        .transport(transport)
        .build()
        .context("Invalid download request")
}

/// Cancels `token` when Ctrl-C is pressed.
pub(crate) fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            token.cancel();
        }
    });
}

/// Download tick data for a symbol into a file.
pub(crate) async fn download(
    symbol: &str,
    args: &FetchArgs,
    output: Option<PathBuf>,
    format: Format,
    delimiter: char,
    quiet: bool,
) -> Result<()> {
    let token = CancellationToken::new();
    let request = build_request(symbol, args, token.clone())?;
    cancel_on_ctrl_c(token);

    // Determine output path (default to <symbol>.<format>)
    let output = output.unwrap_or_else(|| {
        PathBuf::from(format!("{}.{}", symbol.to_lowercase(), format.extension()))
    });

    let slots = request.slots().len();
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb.set_message(format!(
            "{} {} -> {} ({slots} hours)",
            request.symbol(),
            request.start(),
            request.end()
        ));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let ticks = match fetch_ticks(&request).await {
        Ok(ticks) => ticks,
        Err(e) => {
            progress.abandon_with_message("Download failed");
            return Err(e).with_context(|| format!("Failed to download {symbol}"));
        }
    };
    progress.finish_with_message(format!("Downloaded {} ticks", ticks.len()));

    write_ticks(&ticks, &output, format, delimiter)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !quiet {
        println!("Output written to: {}", output.display());
    }

    Ok(())
}
