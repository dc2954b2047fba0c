use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use book_feed::source::pump;
use book_feed::{FeedConfig, JsonLinesSource};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "book-feed", version, about = "Order book feed reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a JSON-lines capture through the feed and print the final book
    Replay {
        /// Capture file, one feed message per line
        capture: PathBuf,
        /// JSON config file; unset fields keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the throttle interval
        #[arg(long)]
        throttle_ms: Option<u64>,
        /// Delay between delivered messages
        #[arg(long, default_value_t = 0)]
        pace_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Replay {
            capture,
            config,
            throttle_ms,
            pace_ms,
        } => {
            let mut feed_config = match config {
                Some(path) => FeedConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => FeedConfig::default(),
            };
            if let Some(throttle_ms) = throttle_ms {
                feed_config.throttle_interval_ms = throttle_ms;
            }

            replay(capture, feed_config, pace_ms).await
        }
    }
}

async fn replay(capture: PathBuf, config: FeedConfig, pace_ms: u64) -> Result<(), anyhow::Error> {
    tracing::info!(capture = %capture.display(), "Replaying feed capture");

    let (sender, _reader, handle) = book_feed::spawn(config);
    let metrics = handle.metrics();

    let mut source = JsonLinesSource::open(&capture).await?;
    let pace = (pace_ms > 0).then(|| Duration::from_millis(pace_ms));
    let stats = pump(&mut source, &sender, pace).await?;
    drop(sender);

    let view = handle.join().await?;

    println!("{}", serde_json::to_string_pretty(&view)?);
    if let Some(spread) = view.book.spread() {
        tracing::info!(%spread, "Final spread");
    }
    tracing::info!(
        delivered = stats.delivered,
        undecodable = stats.undecodable,
        metrics = ?metrics.export(),
        "Replay complete"
    );

    Ok(())
}
