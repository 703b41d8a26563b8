//! Prometheus metrics

use super::Table;
use std::net::SocketAddr;

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Realized P&L for the current UTC day
    DailyPnl,
    /// Trades completed in the current UTC day
    DailyTrades,
    /// Drawdown throttle factor applied to attempt pacing
    ThrottleFactor,
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::DailyPnl => "scalper_daily_pnl_usd",
        GaugeMetric::DailyTrades => "scalper_daily_trades",
        GaugeMetric::ThrottleFactor => "scalper_throttle_factor",
    };

    metrics::gauge!(metric_name).set(value);
}

/// Record one latency sample and the venue's new rolling average
pub fn record_venue_latency(venue: &str, latency_ms: f64, avg_ms: f64) {
    metrics::histogram!("scalper_venue_latency_ms", "venue" => venue.to_string()).record(latency_ms);
    metrics::gauge!("scalper_venue_latency_avg_ms", "venue" => venue.to_string()).set(avg_ms);
}

/// Count a completed paper trade
pub fn record_trade(venue: &str, pnl: f64) {
    metrics::counter!("scalper_trades_total", "venue" => venue.to_string()).increment(1);
    metrics::histogram!("scalper_trade_pnl_usd", "venue" => venue.to_string()).record(pnl);
}

/// Count a trade attempt by outcome
pub fn record_attempt(venue: &str, outcome: &'static str) {
    metrics::counter!("scalper_attempts_total", "venue" => venue.to_string(), "outcome" => outcome)
        .increment(1);
}

/// Count telemetry events dropped before delivery
pub fn record_dropped_event(table: Table, events: u64) {
    metrics::counter!("scalper_telemetry_dropped_total", "table" => table.as_str()).increment(events);
}

/// Count a delivered or abandoned telemetry batch
pub fn record_batch(table: Table, delivered: bool, rows: usize) {
    let outcome = if delivered { "delivered" } else { "failed" };
    metrics::counter!("scalper_telemetry_batches_total", "table" => table.as_str(), "outcome" => outcome)
        .increment(1);
    metrics::counter!("scalper_telemetry_rows_total", "table" => table.as_str(), "outcome" => outcome)
        .increment(rows as u64);
}

/// Install the Prometheus exporter with an HTTP listener
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter on {}: {}", addr, e))?;

    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}
