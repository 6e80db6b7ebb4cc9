//! Polling order feed.
//!
//! A producer task re-reads the full order set on a fixed interval and hands
//! each batch to the consumer over a bounded channel. The transport only
//! sees the consumer side ([`OrderFeed`]), so the poll loop can later be
//! replaced by real change notification without touching it.
//!
//! The producer stops when its [`CancelSignal`] fires or when the
//! [`OrderFeed`] is dropped, in both cases within one interval and without
//! surfacing an error.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

use crate::order::Order;
use crate::store::OrderStore;

/// Trigger side of a cancellation signal.
#[derive(Debug)]
pub struct Cancellation {
    tx: watch::Sender<bool>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A signal observing this trigger.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the signal. Calling it again is a no-op.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observer side of a cancellation signal.
///
/// Dropping the [`Cancellation`] without calling `cancel` leaves the signal
/// pending forever.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires. The feed then runs until it is dropped.
    pub fn never() -> Self {
        Cancellation::new().signal()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal fires.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Statistics from a feed producer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedStats {
    /// Number of store polls started.
    pub polls: usize,
    /// Number of batches delivered to the consumer.
    pub batches: usize,
    /// Number of polls that failed.
    pub failures: usize,
}

/// Consumer side of the order feed. Each item is the full order set.
pub struct OrderFeed {
    batches: mpsc::Receiver<Vec<Order>>,
    task: JoinHandle<FeedStats>,
}

impl OrderFeed {
    /// Wait for the next batch. `None` once the producer has stopped.
    pub async fn next(&mut self) -> Option<Vec<Order>> {
        self.batches.recv().await
    }

    /// Close the feed, wait for the producer to finish, and return its stats.
    pub async fn stop(self) -> FeedStats {
        let OrderFeed { mut batches, task } = self;
        batches.close();
        drop(batches);
        task.await.unwrap_or_else(|e| {
            warn!(error = %e, "order feed producer failed");
            FeedStats::default()
        })
    }
}

impl Stream for OrderFeed {
    type Item = Vec<Order>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.batches.poll_recv(cx)
    }
}

/// Spawn the producer task for a new feed.
pub(super) fn spawn<S>(store: Arc<S>, interval: Duration, mut signal: CancelSignal) -> OrderFeed
where
    S: OrderStore + 'static,
{
    let (tx, rx) = mpsc::channel(1);

    let task = tokio::spawn(async move {
        let mut stats = FeedStats::default();
        info!(interval_ms = interval.as_millis() as u64, "starting order feed");

        loop {
            if signal.is_cancelled() {
                break;
            }

            stats.polls += 1;
            let poll = {
                let store = Arc::clone(&store);
                tokio::task::spawn_blocking(move || store.all())
            };

            let polled = tokio::select! {
                biased;
                _ = signal.cancelled() => break,
                _ = tx.closed() => break,
                joined = poll => joined,
            };

            match polled {
                Ok(Ok(orders)) => {
                    debug!(count = orders.len(), "streaming orders");
                    tokio::select! {
                        biased;
                        _ = signal.cancelled() => break,
                        sent = tx.send(orders) => {
                            if sent.is_err() {
                                break;
                            }
                            stats.batches += 1;
                        }
                    }
                }
                Ok(Err(e)) => {
                    stats.failures += 1;
                    warn!(error = %e, "order feed poll failed");
                }
                Err(e) => {
                    stats.failures += 1;
                    warn!(error = %e, "order feed worker failed");
                }
            }

            tokio::select! {
                biased;
                _ = signal.cancelled() => break,
                _ = tx.closed() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!(polls = stats.polls, batches = stats.batches, "order feed ended");
        stats
    });

    OrderFeed { batches: rx, task }
}
