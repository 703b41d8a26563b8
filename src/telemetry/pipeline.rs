//! Batched telemetry delivery
//!
//! Drains both queues every flush interval, posts each non-empty batch to the
//! sink with bounded exponential backoff, and drops a batch once attempts are
//! exhausted. On shutdown a final flush runs within `flush_timeout`.

use super::metrics::record_batch;
use super::queue::TelemetryReceivers;
use super::{DeliveryError, LatencyEvent, Table, TelemetrySink, TelemetryStats, TradeEvent};
use crate::config::DeliveryConfig;
use crate::shutdown::Shutdown;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Retry schedule for a single batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Backoff to wait after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_backoff;
        for _ in 1..attempt {
            delay = (delay * 2).min(self.max_backoff);
        }
        delay.min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&DeliveryConfig::default())
    }
}

/// Consumer of the telemetry queues
pub struct TelemetryPipeline {
    receivers: TelemetryReceivers,
    sink: Option<Arc<dyn TelemetrySink>>,
    retry: RetryPolicy,
    batch_size: usize,
    flush_interval: Duration,
    flush_timeout: Duration,
    // Batches being posted. A post cut off by the flush timeout leaves its
    // rows here to be counted as dropped, never re-sent.
    latency_batch: Vec<LatencyEvent>,
    trade_batch: Vec<TradeEvent>,
}

impl TelemetryPipeline {
    /// A `None` sink disables delivery
    pub fn new(
        receivers: TelemetryReceivers,
        sink: Option<Arc<dyn TelemetrySink>>,
        config: &DeliveryConfig,
    ) -> Self {
        Self {
            receivers,
            sink,
            retry: RetryPolicy::from_config(config),
            batch_size: config.batch_size.max(1),
            flush_interval: Duration::from_millis(config.flush_interval_ms),
            flush_timeout: Duration::from_millis(config.flush_timeout_ms),
            latency_batch: Vec::new(),
            trade_batch: Vec::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn stats(&self) -> TelemetryStats {
        self.receivers.stats()
    }

    /// Post one batch, retrying with capped exponential backoff
    ///
    /// Empty batches are never sent. A disabled pipeline accepts everything
    /// without sending.
    pub async fn post<T: Serialize + Sync>(
        &self,
        table: Table,
        rows: &[T],
    ) -> Result<(), DeliveryError> {
        let Some(sink) = self.sink.as_ref() else {
            return Ok(());
        };
        if rows.is_empty() {
            return Ok(());
        }

        let body = serde_json::to_value(rows)?;
        let attempts = self.retry.max_attempts;

        for attempt in 1..=attempts {
            match sink.post(table, &body).await {
                Ok(()) => {
                    self.receivers.counters.delivered(rows.len());
                    record_batch(table, true, rows.len());
                    tracing::debug!(%table, rows = rows.len(), attempt, "Telemetry batch delivered");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(%table, attempt, error = %e, "Telemetry post failed");
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.retry.backoff(attempt)).await;
            }
        }

        self.receivers.counters.failed(rows.len());
        record_batch(table, false, rows.len());
        tracing::error!(%table, rows = rows.len(), attempts, "Telemetry batch dropped");
        Err(DeliveryError::RetriesExhausted { table, attempts })
    }

    /// Drain up to one batch per table and deliver it
    ///
    /// Returns the number of rows handled, whether delivered or dropped.
    pub async fn deliver_pending(&mut self) -> usize {
        let room = self.batch_size.saturating_sub(self.latency_batch.len());
        let drained = self.receivers.drain_latency(room);
        self.latency_batch.extend(drained);

        let room = self.batch_size.saturating_sub(self.trade_batch.len());
        let drained = self.receivers.drain_trades(room);
        self.trade_batch.extend(drained);

        let mut handled = 0;

        if !self.latency_batch.is_empty() {
            // Failure is already logged and counted
            let _ = self.post(Table::LatencyLogs, &self.latency_batch).await;
            handled += self.latency_batch.len();
            self.latency_batch.clear();
        }

        if !self.trade_batch.is_empty() {
            let _ = self.post(Table::TradeLogs, &self.trade_batch).await;
            handled += self.trade_batch.len();
            self.trade_batch.clear();
        }

        handled
    }

    /// Deliver until both queues are empty
    pub async fn flush(&mut self) -> usize {
        let mut total = 0;
        loop {
            let handled = self.deliver_pending().await;
            if handled == 0 {
                return total;
            }
            total += handled;
        }
    }

    /// Run until shutdown, then flush within the flush timeout
    ///
    /// A delivery under way when shutdown arrives runs to completion, bounded
    /// by the flush timeout; a batch already handed to the sink is never
    /// started over.
    pub async fn run(mut self, mut shutdown: Shutdown) -> TelemetryStats {
        if !self.is_enabled() {
            tracing::info!(
                "Telemetry delivery disabled; set SCALPER_SINK_URL and SCALPER_SINK_API_KEY to enable"
            );
            shutdown.wait().await;
            return self.stats();
        }

        tracing::info!(
            batch_size = self.batch_size,
            flush_interval_ms = self.flush_interval.as_millis() as u64,
            "Telemetry pipeline started"
        );

        let flush_timeout = self.flush_timeout;
        let deadline = loop {
            tokio::select! {
                _ = tokio::time::sleep(self.flush_interval) => {}
                _ = shutdown.wait() => break Some(Instant::now() + flush_timeout),
            }

            let delivery = self.deliver_pending();
            tokio::pin!(delivery);
            tokio::select! {
                _ = &mut delivery => continue,
                _ = shutdown.wait() => {}
            }

            let deadline = Instant::now() + flush_timeout;
            match tokio::time::timeout_at(deadline, delivery).await {
                Ok(_) => break Some(deadline),
                Err(_) => break None,
            }
        };

        let flushed = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.flush()).await.ok(),
            None => None,
        };
        match flushed {
            Some(rows) => tracing::info!(rows, "Telemetry flushed"),
            None => {
                let (latency, trades) = self.abandon_remaining();
                tracing::error!(
                    latency_dropped = latency,
                    trades_dropped = trades,
                    timeout_ms = flush_timeout.as_millis() as u64,
                    "Telemetry flush timed out, remaining events dropped"
                );
            }
        }

        let stats = self.stats();
        tracing::info!(
            rows_delivered = stats.rows_delivered,
            rows_failed = stats.rows_failed,
            latency_dropped = stats.latency_dropped,
            trades_dropped = stats.trades_dropped,
            "Telemetry pipeline stopped"
        );
        stats
    }

    /// Drop everything not yet delivered; returns (latency, trade) counts
    fn abandon_remaining(&mut self) -> (u64, u64) {
        let latency = (self.latency_batch.len() + self.receivers.drain_latency(usize::MAX).len()) as u64;
        let trades = (self.trade_batch.len() + self.receivers.drain_trades(usize::MAX).len()) as u64;
        self.latency_batch.clear();
        self.trade_batch.clear();

        self.receivers.counters.dropped(Table::LatencyLogs, latency);
        self.receivers.counters.dropped(Table::TradeLogs, trades);
        (latency, trades)
    }
}
