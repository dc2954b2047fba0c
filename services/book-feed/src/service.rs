//! Async feed service
//!
//! Runs the reconciler and the throttle gate on a single task. Inbound
//! messages and the release timer are both handled inside one
//! `tokio::select!` loop, so reconciliation passes never overlap and the
//! engine needs no locks. The timer is armed only while an update is
//! parked, for the instant the gate reopens.
//!
//! ```text
//! FeedSender ──mpsc──┐
//!                    ├─► parse ─► ThrottleGate ─► BookReconciler
//! release timer ─────┘                                 │
//!                                    watch<Arc<BookView>>
//!                                                      │
//!                                                  BookReader
//! ```
//!
//! Readers get whole `Arc<BookView>` snapshots and never block the task.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use types::book::BookView;

use crate::config::FeedConfig;
use crate::events::BookUpdate;
use crate::ingestion::parse_update;
use crate::metrics::FeedMetrics;
use crate::order_book::{ApplyOutcome, BookReconciler};
use crate::source::FeedError;
use crate::throttle::{Admission, ThrottleGate};

/// A raw message as delivered by a transport.
pub type RawMessage = serde_json::Value;

/// Delivery side handed to transport collaborators.
#[derive(Debug, Clone)]
pub struct FeedSender {
    tx: mpsc::Sender<RawMessage>,
}

impl FeedSender {
    /// Deliver a message, waiting if the inbound channel is full.
    pub async fn deliver(&self, message: RawMessage) -> Result<(), FeedError> {
        self.tx.send(message).await.map_err(|_| FeedError::Closed)
    }

    /// Deliver without waiting.
    ///
    /// Fails with [`FeedError::Full`] while the inbound channel is at
    /// capacity and with [`FeedError::Closed`] once the service stopped.
    pub fn try_deliver(&self, message: RawMessage) -> Result<(), FeedError> {
        self.tx.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => FeedError::Full,
            TrySendError::Closed(_) => FeedError::Closed,
        })
    }
}

/// Read side handed to presentation collaborators.
#[derive(Debug, Clone)]
pub struct BookReader {
    rx: watch::Receiver<Arc<BookView>>,
}

impl BookReader {
    /// Latest published view.
    pub fn current(&self) -> Arc<BookView> {
        Arc::clone(&self.rx.borrow())
    }

    /// Sequence of the latest published book.
    pub fn sequence(&self) -> u64 {
        self.rx.borrow().book.sequence
    }

    /// Wait for the next publication and return it.
    pub async fn changed(&mut self) -> Result<Arc<BookView>, FeedError> {
        self.rx.changed().await.map_err(|_| FeedError::Closed)?;
        Ok(Arc::clone(&self.rx.borrow_and_update()))
    }

    /// Wait until the published book reaches `sequence`.
    pub async fn wait_for_sequence(&mut self, sequence: u64) -> Result<Arc<BookView>, FeedError> {
        let view = self
            .rx
            .wait_for(|view| view.book.sequence >= sequence)
            .await
            .map_err(|_| FeedError::Closed)?;
        Ok(Arc::clone(&view))
    }
}

/// Owns the service task. Dropping the handle stops the service.
#[derive(Debug)]
pub struct FeedHandle {
    task: JoinHandle<BookView>,
    shutdown: oneshot::Sender<()>,
    metrics: Arc<FeedMetrics>,
}

impl FeedHandle {
    /// Stop the service and return its final view.
    ///
    /// A parked update is applied before the task exits.
    pub async fn shutdown(self) -> Result<BookView, FeedError> {
        let FeedHandle { task, shutdown, .. } = self;
        // The task may already have stopped; that is fine.
        let _ = shutdown.send(());
        task.await.map_err(|err| FeedError::Task(err.to_string()))
    }

    /// Wait for the service to stop on its own, i.e. after every
    /// [`FeedSender`] has been dropped.
    pub async fn join(self) -> Result<BookView, FeedError> {
        let FeedHandle { task, shutdown, .. } = self;
        let result = task.await.map_err(|err| FeedError::Task(err.to_string()));
        drop(shutdown);
        result
    }

    pub fn metrics(&self) -> Arc<FeedMetrics> {
        Arc::clone(&self.metrics)
    }
}

/// Start a feed service on the current tokio runtime.
pub fn spawn(config: FeedConfig) -> (FeedSender, BookReader, FeedHandle) {
    let metrics = Arc::new(FeedMetrics::new());
    let (tx, inbound) = mpsc::channel(config.channel_capacity.max(1));
    let (publisher, rx) = watch::channel(Arc::new(BookView::default()));
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let worker = FeedWorker {
        reconciler: BookReconciler::new(&config, Arc::clone(&metrics)),
        gate: ThrottleGate::new(config.throttle_interval()),
        metrics: Arc::clone(&metrics),
        publisher,
    };

    info!(
        symbol = %config.symbol,
        throttle_ms = config.throttle_interval_ms,
        channel_capacity = config.channel_capacity,
        "Starting feed service"
    );
    let task = tokio::spawn(worker.run(inbound, shutdown_rx));

    (
        FeedSender { tx },
        BookReader { rx },
        FeedHandle {
            task,
            shutdown: shutdown_tx,
            metrics,
        },
    )
}

struct FeedWorker {
    reconciler: BookReconciler,
    gate: ThrottleGate,
    metrics: Arc<FeedMetrics>,
    publisher: watch::Sender<Arc<BookView>>,
}

impl FeedWorker {
    async fn run(
        mut self,
        mut inbound: mpsc::Receiver<RawMessage>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> BookView {
        loop {
            let release = self.gate.next_release();

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Feed service shutdown requested");
                    break;
                }
                message = inbound.recv() => match message {
                    Some(raw) => self.handle_message(raw),
                    None => {
                        info!("All feed senders dropped");
                        break;
                    }
                },
                _ = tokio::time::sleep_until(release.unwrap_or_else(Instant::now)),
                    if release.is_some() => self.drain_pending(),
            }
        }

        if let Some(update) = self.gate.take_pending() {
            debug!(sequence = update.sequence, "Flushing parked update on shutdown");
            self.apply(update);
        }

        info!(
            sequence = self.reconciler.sequence(),
            published = self.metrics.updates_published(),
            "Feed service stopped"
        );
        self.reconciler.view()
    }

    fn handle_message(&mut self, raw: RawMessage) {
        self.metrics.record_received();

        let update = match parse_update(&raw) {
            Ok(update) => update,
            Err(err) => {
                warn!(error = %err, "Dropping malformed feed message");
                self.metrics.record_malformed();
                return;
            }
        };

        let coalesced_before = self.gate.coalesced();
        let sequence = update.sequence;
        let levels = update.level_count();
        let admission = self.gate.offer(update, Instant::now());
        self.metrics
            .record_coalesced(self.gate.coalesced() - coalesced_before);

        match admission {
            Admission::Ready(update) => self.apply(update),
            Admission::Parked { replaced } => {
                debug!(sequence, levels, replaced, "Update parked until the gate reopens");
            }
            Admission::Superseded => {
                debug!(
                    sequence,
                    parked = ?self.gate.pending_sequence(),
                    "Update superseded by newer parked update"
                );
            }
        }
    }

    fn drain_pending(&mut self) {
        if let Some(update) = self.gate.poll_pending(Instant::now()) {
            debug!(sequence = update.sequence, "Releasing parked update");
            self.apply(update);
        }
    }

    fn apply(&mut self, update: BookUpdate) {
        match self.reconciler.apply_update(&update) {
            // Empty passes can still add change events.
            ApplyOutcome::Published | ApplyOutcome::Empty => {
                self.publisher
                    .send_replace(Arc::new(self.reconciler.view()));
            }
            ApplyOutcome::Stale { .. } | ApplyOutcome::Failed(_) => {}
        }
    }
}
