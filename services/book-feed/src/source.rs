//! Transport seam
//!
//! A [`FeedSource`] yields raw messages from wherever the feed comes from;
//! [`pump`] forwards them into a running feed service. Connection handling,
//! reconnects and subscriptions belong to the source and never touch
//! reconciliation state: a reconnecting source just resumes yielding
//! messages and the sequence gate absorbs any replayed overlap.
//!
//! [`JsonLinesSource`] replays a newline-delimited JSON capture.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{info, warn};

use crate::service::{FeedSender, RawMessage};

/// Errors raised by sources and by the feed service boundary.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("i/o error reading feed: {0}")]
    Io(#[from] std::io::Error),

    #[error("undecodable message on line {line}: {reason}")]
    Decode { line: usize, reason: String },

    #[error("feed service has stopped")]
    Closed,

    #[error("feed service inbound channel is full")]
    Full,

    #[error("feed task ended abnormally: {0}")]
    Task(String),
}

/// Something that yields raw feed messages.
#[async_trait]
pub trait FeedSource: Send {
    /// Next raw message; `None` once the source is exhausted.
    ///
    /// A `Decode` error covers a single message; the source can still be
    /// read afterwards.
    async fn next_message(&mut self) -> Option<Result<RawMessage, FeedError>>;
}

/// Replays one JSON message per line; blank lines are skipped.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a capture file.
    pub async fn open(path: &Path) -> Result<Self, FeedError> {
        let file = File::open(path).await?;
        info!(path = %path.display(), "Opened feed capture");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FeedSource for JsonLinesSource<R> {
    async fn next_message(&mut self) -> Option<Result<RawMessage, FeedError>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(err) => return Some(Err(FeedError::Io(err))),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(
                serde_json::from_str(&line).map_err(|err| FeedError::Decode {
                    line: self.line_no,
                    reason: err.to_string(),
                }),
            );
        }
    }
}

/// Totals from one [`pump`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Messages handed to the service.
    pub delivered: u64,
    /// Messages the source could not decode (skipped).
    pub undecodable: u64,
}

/// Forward every message from `source` into the service.
///
/// Undecodable messages are logged and skipped. I/O errors and a stopped
/// service end the run. With `pace`, waits that long between deliveries.
pub async fn pump<S>(
    source: &mut S,
    sender: &FeedSender,
    pace: Option<Duration>,
) -> Result<PumpStats, FeedError>
where
    S: FeedSource + ?Sized,
{
    let mut stats = PumpStats::default();

    while let Some(next) = source.next_message().await {
        match next {
            Ok(message) => {
                sender.deliver(message).await?;
                stats.delivered += 1;
                if let Some(pace) = pace {
                    tokio::time::sleep(pace).await;
                }
            }
            Err(FeedError::Decode { line, reason }) => {
                stats.undecodable += 1;
                warn!(line, reason = %reason, "Skipping undecodable message");
            }
            Err(err) => return Err(err),
        }
    }

    info!(
        delivered = stats.delivered,
        undecodable = stats.undecodable,
        "Feed source exhausted"
    );
    Ok(stats)
}
