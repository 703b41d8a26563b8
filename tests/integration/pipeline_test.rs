//! Telemetry delivery tests

use async_trait::async_trait;
use latency_scalper::config::DeliveryConfig;
use latency_scalper::shutdown::shutdown_channel;
use latency_scalper::telemetry::{
    telemetry_channel, DeliveryError, LatencyEvent, Table, TelemetryPipeline, TelemetrySink,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct FailingSink {
    calls: AtomicU32,
}

#[async_trait]
impl TelemetrySink for FailingSink {
    async fn post(&self, _table: Table, _rows: &serde_json::Value) -> Result<(), DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::Status(500))
    }
}

/// Sink whose requests never complete
struct HangingSink;

#[async_trait]
impl TelemetrySink for HangingSink {
    async fn post(&self, _table: Table, _rows: &serde_json::Value) -> Result<(), DeliveryError> {
        std::future::pending().await
    }
}

fn delivery(max_attempts: u32) -> DeliveryConfig {
    DeliveryConfig {
        max_attempts,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
        flush_interval_ms: 3_600_000,
        flush_timeout_ms: 50,
        ..DeliveryConfig::default()
    }
}

#[tokio::test]
async fn test_batch_dropped_after_max_attempts() {
    let sink = Arc::new(FailingSink {
        calls: AtomicU32::new(0),
    });
    let (queues, receivers) = telemetry_channel(100, true);
    let mut pipeline = TelemetryPipeline::new(receivers, Some(sink.clone()), &delivery(3));

    for ms in [10.0, 20.0] {
        assert!(queues.enqueue_latency(LatencyEvent::new("BINANCE", ms)));
    }

    assert_eq!(pipeline.deliver_pending().await, 2);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 3);

    let stats = queues.stats();
    assert_eq!(stats.batches_failed, 1);
    assert_eq!(stats.rows_failed, 2);
    assert_eq!(stats.rows_delivered, 0);

    // The dropped batch is gone; nothing left to send
    assert_eq!(pipeline.deliver_pending().await, 0);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_flush_bounded_by_timeout() {
    let (queues, receivers) = telemetry_channel(100, true);
    let pipeline = TelemetryPipeline::new(receivers, Some(Arc::new(HangingSink)), &delivery(5));

    for ms in [1.0, 2.0, 3.0] {
        queues.enqueue_latency(LatencyEvent::new("OKX", ms));
    }

    let (trigger, shutdown) = shutdown_channel();
    trigger.trigger();

    let stats = tokio::time::timeout(Duration::from_secs(2), pipeline.run(shutdown))
        .await
        .expect("flush must respect its timeout");
    assert_eq!(stats.latency_dropped, 3);
    assert_eq!(stats.rows_delivered, 0);
}
