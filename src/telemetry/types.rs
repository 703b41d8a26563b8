//! Telemetry row and delivery types

use crate::execution::{Side, TradeRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Remote tables accepting telemetry rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    LatencyLogs,
    TradeLogs,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::LatencyLogs => "latency_logs",
            Table::TradeLogs => "trade_logs",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telemetry delivery failures
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("failed to encode rows: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{table} batch dropped after {attempts} attempts")]
    RetriesExhausted { table: Table, attempts: u32 },
}

/// One latency sample row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyEvent {
    pub venue: String,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl LatencyEvent {
    pub fn new(venue: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            venue: venue.into(),
            latency_ms: latency_ms.max(0.0).round() as u64,
            timestamp: Utc::now(),
        }
    }
}

/// One completed trade row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    pub venue: String,
    pub symbol: String,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub size_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_px: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub exit_px: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pnl: Decimal,
    pub duration_seconds: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&TradeRecord> for TradeEvent {
    fn from(record: &TradeRecord) -> Self {
        Self {
            venue: record.venue.clone(),
            symbol: record.symbol.clone(),
            side: record.side,
            size_usd: record.size_usd,
            entry_px: record.entry_price,
            exit_px: record.exit_price,
            pnl: record.pnl,
            duration_seconds: record.duration.as_secs_f64(),
            timestamp: record.timestamp,
        }
    }
}

/// Delivery counters since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryStats {
    pub latency_dropped: u64,
    pub trades_dropped: u64,
    pub batches_delivered: u64,
    pub rows_delivered: u64,
    pub batches_failed: u64,
    pub rows_failed: u64,
}
