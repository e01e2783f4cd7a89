//! tickfetch CLI - Dukascopy hourly tick data downloader.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use display::{DateArg, Format};

#[derive(Parser)]
#[command(name = "tickfetch")]
#[command(about = "Dukascopy hourly tick data downloader", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Options shared by every command that talks to the feed.
#[derive(clap::Args, Clone, Debug)]
struct FetchArgs {
    /// Range start: RFC 3339, YYYY-MM-DD or YYYY-MM-DDTHH (UTC)
    #[arg(short, long)]
    start: DateArg,

    /// Range end: RFC 3339, YYYY-MM-DD or YYYY-MM-DDTHH (UTC)
    #[arg(short, long)]
    end: DateArg,

    /// Maximum concurrent hour downloads
    #[arg(long, default_value = "8")]
    concurrency: usize,

    /// Retries per hour after the first attempt
    #[arg(long, default_value = "5")]
    max_retries: u32,

    /// Fixed delay between attempts, in seconds
    #[arg(long, default_value = "15")]
    retry_delay_secs: u64,

    /// Datafeed base URL
    #[arg(long, default_value = tickfetch_lib::url::BASE_URL)]
    base_url: String,
}

impl FetchArgs {
    const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Download ticks into a file, sorted by timestamp
    Download {
        /// Instrument symbol (e.g., EURUSD, BTCUSD)
        symbol: String,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Output file path. Defaults to <symbol>.<format>
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Field delimiter for CSV output
        #[arg(long, default_value = ";")]
        delimiter: char,
    },

    /// Stream ticks to stdout as NDJSON while they are downloaded
    Stream {
        /// Instrument symbol (e.g., EURUSD, BTCUSD)
        symbol: String,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Print the hour slot URLs a download would fetch
    Slots {
        /// Instrument symbol (e.g., EURUSD, BTCUSD)
        symbol: String,

        /// Range start: RFC 3339, YYYY-MM-DD or YYYY-MM-DDTHH (UTC)
        #[arg(short, long)]
        start: DateArg,

        /// Range end: RFC 3339, YYYY-MM-DD or YYYY-MM-DDTHH (UTC)
        #[arg(short, long)]
        end: DateArg,

        /// Datafeed base URL
        #[arg(long, default_value = tickfetch_lib::url::BASE_URL)]
        base_url: String,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tickfetch={default_level},tickfetch_fetch={default_level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Download {
            symbol,
            fetch,
            output,
            format,
            delimiter,
        } => {
            commands::download::download(&symbol, &fetch, output, format, delimiter, cli.quiet)
                .await
        }
        Commands::Stream { symbol, fetch } => commands::stream::stream(&symbol, &fetch).await,
        Commands::Slots {
            symbol,
            start,
            end,
            base_url,
        } => commands::slots::slots(&symbol, start.into(), end.into(), &base_url),
    }
}
