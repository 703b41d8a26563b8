//! Telemetry module
//!
//! Structured logging, Prometheus metrics, and the batched delivery of
//! latency samples and trades to a remote REST table store.

mod logging;
mod metrics;
mod pipeline;
mod queue;
mod sink;
mod types;

pub use logging::{init_logging, LogFormat};
pub use metrics::{
    init_metrics, record_attempt, record_batch, record_dropped_event, record_trade,
    record_venue_latency, set_gauge, GaugeMetric,
};
pub use pipeline::{RetryPolicy, TelemetryPipeline};
pub use queue::{telemetry_channel, TelemetryQueues, TelemetryReceivers};
pub use sink::{RestSink, TelemetrySink};
pub use types::{DeliveryError, LatencyEvent, Table, TelemetryStats, TradeEvent};

use crate::config::TelemetryConfig;

/// Initialize logging and, when a port is configured, the metrics exporter
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        init_metrics(port)?;
    }

    Ok(())
}
