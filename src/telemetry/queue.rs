//! Bounded telemetry queues
//!
//! Producers never block: a full queue drops the event, logs a warning and
//! bumps a counter. Delivery is at-most-once.

use super::metrics::record_dropped_event;
use super::{LatencyEvent, Table, TelemetryStats, TradeEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

/// Shared delivery counters
#[derive(Debug, Default)]
pub(crate) struct Counters {
    latency_dropped: AtomicU64,
    trades_dropped: AtomicU64,
    batches_delivered: AtomicU64,
    rows_delivered: AtomicU64,
    batches_failed: AtomicU64,
    rows_failed: AtomicU64,
}

impl Counters {
    /// Count dropped events in the stats and the dropped-events metric
    pub(crate) fn dropped(&self, table: Table, events: u64) {
        if events == 0 {
            return;
        }
        match table {
            Table::LatencyLogs => self.latency_dropped.fetch_add(events, Ordering::Relaxed),
            Table::TradeLogs => self.trades_dropped.fetch_add(events, Ordering::Relaxed),
        };
        record_dropped_event(table, events);
    }

    pub(crate) fn delivered(&self, rows: usize) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.rows_delivered.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub(crate) fn failed(&self, rows: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.rows_failed.fetch_add(rows as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> TelemetryStats {
        TelemetryStats {
            latency_dropped: self.latency_dropped.load(Ordering::Relaxed),
            trades_dropped: self.trades_dropped.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            rows_delivered: self.rows_delivered.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            rows_failed: self.rows_failed.load(Ordering::Relaxed),
        }
    }
}

/// Producer handle to the two telemetry queues
///
/// Cheap to clone. When delivery is disabled every enqueue is a no-op.
#[derive(Debug, Clone)]
pub struct TelemetryQueues {
    enabled: bool,
    latency_tx: mpsc::Sender<LatencyEvent>,
    trade_tx: mpsc::Sender<TradeEvent>,
    counters: Arc<Counters>,
}

/// Consumer side of the telemetry queues, owned by the pipeline
#[derive(Debug)]
pub struct TelemetryReceivers {
    latency_rx: mpsc::Receiver<LatencyEvent>,
    trade_rx: mpsc::Receiver<TradeEvent>,
    pub(crate) counters: Arc<Counters>,
}

/// Create both queues with the given depth
pub fn telemetry_channel(capacity: usize, enabled: bool) -> (TelemetryQueues, TelemetryReceivers) {
    let capacity = capacity.max(1);
    let (latency_tx, latency_rx) = mpsc::channel(capacity);
    let (trade_tx, trade_rx) = mpsc::channel(capacity);
    let counters = Arc::new(Counters::default());

    (
        TelemetryQueues {
            enabled,
            latency_tx,
            trade_tx,
            counters: counters.clone(),
        },
        TelemetryReceivers {
            latency_rx,
            trade_rx,
            counters,
        },
    )
}

impl TelemetryQueues {
    /// Queues that accept nothing, for tools that never deliver
    pub fn disabled() -> Self {
        telemetry_channel(1, false).0
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enqueue a latency sample; returns false when the event was dropped
    pub fn enqueue_latency(&self, event: LatencyEvent) -> bool {
        if !self.enabled {
            return false;
        }
        let venue = event.venue.clone();
        self.handle_send(Table::LatencyLogs, self.latency_tx.try_send(event), &venue)
    }

    /// Enqueue a trade; returns false when the event was dropped
    pub fn enqueue_trade(&self, event: TradeEvent) -> bool {
        if !self.enabled {
            return false;
        }
        let venue = event.venue.clone();
        self.handle_send(Table::TradeLogs, self.trade_tx.try_send(event), &venue)
    }

    fn handle_send<T>(&self, table: Table, result: Result<(), TrySendError<T>>, venue: &str) -> bool {
        match result {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.counters.dropped(table, 1);
                tracing::warn!(%table, venue, "Telemetry queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.counters.dropped(table, 1);
                tracing::warn!(%table, venue, "Telemetry pipeline stopped, event dropped");
                false
            }
        }
    }

    /// Events waiting in the latency queue
    pub fn pending_latency(&self) -> usize {
        self.latency_tx.max_capacity() - self.latency_tx.capacity()
    }

    /// Events waiting in the trade queue
    pub fn pending_trades(&self) -> usize {
        self.trade_tx.max_capacity() - self.trade_tx.capacity()
    }

    pub fn stats(&self) -> TelemetryStats {
        self.counters.snapshot()
    }
}

impl TelemetryReceivers {
    /// Take up to `max` latency events, oldest first
    pub fn drain_latency(&mut self, max: usize) -> Vec<LatencyEvent> {
        drain(&mut self.latency_rx, max)
    }

    /// Take up to `max` trade events, oldest first
    pub fn drain_trades(&mut self, max: usize) -> Vec<TradeEvent> {
        drain(&mut self.trade_rx, max)
    }

    pub fn stats(&self) -> TelemetryStats {
        self.counters.snapshot()
    }
}

fn drain<T>(rx: &mut mpsc::Receiver<T>, max: usize) -> Vec<T> {
    let mut batch = Vec::new();
    while batch.len() < max {
        match rx.try_recv() {
            Ok(event) => batch.push(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    batch
}
