//! End-to-end scheduler tests with in-process venues and sink

use async_trait::async_trait;
use latency_scalper::config::Config;
use latency_scalper::execution::{PaperFillSimulator, Side};
use latency_scalper::scheduler::Scheduler;
use latency_scalper::telemetry::{DeliveryError, Table, TelemetrySink};
use latency_scalper::venue::{LatencyProbe, Quote, QuoteSource, VenueError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Every venue answers in 20 ms
struct FastProbe;

#[async_trait]
impl LatencyProbe for FastProbe {
    async fn ping(&self, _url: &str) -> Result<Duration, VenueError> {
        Ok(Duration::from_millis(20))
    }
}

/// Mid rises 0.05 per request with a 0.2% spread
#[derive(Default)]
struct RisingQuotes {
    requests: AtomicU64,
}

#[async_trait]
impl QuoteSource for RisingQuotes {
    async fn best_bid_ask(&self, _symbol: &str) -> Result<Quote, VenueError> {
        let n = self.requests.fetch_add(1, Ordering::SeqCst);
        let mid = dec!(100) + Decimal::from(n) * dec!(0.05);
        Ok(Quote::new(mid - dec!(0.1), mid + dec!(0.1)))
    }
}

/// Records every row it receives
#[derive(Default)]
struct RecordingSink {
    rows: Mutex<Vec<(Table, serde_json::Value)>>,
}

impl RecordingSink {
    fn rows(&self, table: Table) -> Vec<serde_json::Value> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn post(&self, table: Table, rows: &serde_json::Value) -> Result<(), DeliveryError> {
        let mut recorded = self.rows.lock().unwrap();
        for row in rows.as_array().into_iter().flatten() {
            recorded.push((table, row.clone()));
        }
        Ok(())
    }
}

fn fast_config(max_trades: u32) -> Config {
    let mut config = Config::default();
    config.engine.symbols = vec!["BTCUSDT".to_string()];
    config.engine.sweep_interval_ms = 10;
    config.engine.status_interval_secs = 3600;
    config.monitor.interval_ms = 5;
    config.risk.max_trades_per_day = max_trades;
    config.telemetry.delivery.flush_interval_ms = 20;
    config
}

fn scheduler(config: Config, sink: Option<Arc<RecordingSink>>) -> Scheduler {
    let mut builder = Scheduler::builder(config)
        .probe(Arc::new(FastProbe))
        .quote_source("BINANCE", Arc::new(RisingQuotes::default()))
        .quote_source("OKX", Arc::new(RisingQuotes::default()))
        .fill_simulator(Arc::new(PaperFillSimulator::new(Duration::ZERO, dec!(0.002))));
    if let Some(sink) = sink {
        builder = builder.sink(sink);
    }
    builder.build().unwrap()
}

#[tokio::test]
async fn test_trades_and_latency_reach_sink() {
    let sink = Arc::new(RecordingSink::default());
    let scheduler = scheduler(fast_config(250), Some(sink.clone()));
    let engine = scheduler.engine().clone();

    let stats = scheduler
        .run(tokio::time::sleep(Duration::from_millis(400)))
        .await
        .unwrap();

    let trades = engine.recent_trades().await;
    assert!(!trades.is_empty(), "rising quotes should trade");
    assert!(trades.iter().all(|t| t.side == Side::Long));
    assert!(trades.iter().all(|t| t.pnl > Decimal::ZERO));

    // Two-stage shutdown: every trade made before the stop is delivered
    let daily_trades = engine.risk().snapshot().await.daily_trades as usize;
    let trade_rows = sink.rows(Table::TradeLogs);
    assert_eq!(trade_rows.len(), daily_trades);
    let row = &trade_rows[0];
    assert_eq!(row["side"], "LONG");
    assert!(row["pnl"].is_number());
    assert!(row["timestamp"].is_string());

    let latency_rows = sink.rows(Table::LatencyLogs);
    assert!(!latency_rows.is_empty());
    assert_eq!(latency_rows[0]["latency_ms"], 20);

    assert_eq!(stats.latency_dropped, 0);
    assert_eq!(stats.trades_dropped, 0);
    assert_eq!(stats.rows_failed, 0);
    assert_eq!(
        stats.rows_delivered as usize,
        trade_rows.len() + latency_rows.len()
    );
}

#[tokio::test]
async fn test_trade_cap_halts_engine() {
    // One venue and one symbol, so attempts never overlap
    let mut config = fast_config(3);
    config.venues.truncate(1);
    let scheduler = scheduler(config, None);
    let engine = scheduler.engine().clone();

    scheduler
        .run(tokio::time::sleep(Duration::from_millis(400)))
        .await
        .unwrap();

    assert_eq!(engine.recent_trades().await.len(), 3);
    let risk = engine.risk().snapshot().await;
    assert_eq!(risk.daily_trades, 3);
    assert!(risk.halt.is_some());
}

#[tokio::test]
async fn test_disabled_telemetry_runs_and_stops() {
    let scheduler = scheduler(fast_config(250), None);

    let stats = tokio::time::timeout(
        Duration::from_secs(2),
        scheduler.run(tokio::time::sleep(Duration::from_millis(50))),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(stats.rows_delivered, 0);
    assert_eq!(stats.latency_dropped, 0);
}
