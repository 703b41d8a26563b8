//! Trade decision engine
//!
//! One attempt walks a (venue, symbol) pair through the risk gate, quote
//! fetch, spread filter, momentum check and paper fill. Each shared aggregate
//! has its own lock and none is held across an I/O await.

use super::{pace, AttemptOutcome, AttemptPacer, RecentTrades};
use crate::config::{EngineConfig, MomentumConfig};
use crate::execution::{EntryOrder, FillSimulator, Side, TradeRecord};
use crate::momentum::MomentumDetector;
use crate::risk::RiskLimiter;
use crate::shutdown::Shutdown;
use crate::telemetry::{record_attempt, record_trade, TelemetryQueues, TradeEvent};
use crate::venue::{Quote, Venue};
use chrono::Utc;
use futures_util::future::join_all;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Evaluates and paper-trades every configured (venue, symbol) pair
pub struct TradeDecisionEngine {
    venues: Vec<Arc<Venue>>,
    symbols: Vec<String>,
    risk: RiskLimiter,
    momentum: Mutex<MomentumDetector>,
    fill: Arc<dyn FillSimulator>,
    recent: Arc<RwLock<RecentTrades>>,
    pacer: Mutex<AttemptPacer>,
    telemetry: TelemetryQueues,
    epsilon_pct: Decimal,
    quote_timeout: Duration,
    sweep_interval: Duration,
}

impl TradeDecisionEngine {
    pub fn new(
        venues: Vec<Arc<Venue>>,
        risk: RiskLimiter,
        fill: Arc<dyn FillSimulator>,
        telemetry: TelemetryQueues,
        engine: &EngineConfig,
        momentum: &MomentumConfig,
    ) -> Self {
        Self {
            venues,
            symbols: engine.symbols.clone(),
            risk,
            momentum: Mutex::new(MomentumDetector::new(momentum)),
            fill,
            recent: Arc::new(RwLock::new(RecentTrades::new(engine.recent_trades))),
            pacer: Mutex::new(AttemptPacer::new()),
            telemetry,
            epsilon_pct: momentum.epsilon_pct,
            quote_timeout: Duration::from_millis(engine.quote_timeout_ms),
            sweep_interval: Duration::from_millis(engine.sweep_interval_ms),
        }
    }

    pub fn venues(&self) -> &[Arc<Venue>] {
        &self.venues
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn risk(&self) -> &RiskLimiter {
        &self.risk
    }

    /// Completed trades, newest first
    pub async fn recent_trades(&self) -> Vec<TradeRecord> {
        self.recent.read().await.to_vec()
    }

    /// Run one trade attempt for a venue and symbol
    pub async fn attempt(&self, venue: &Venue, symbol: &str, shutdown: &Shutdown) -> AttemptOutcome {
        let outcome = self.evaluate(venue, symbol, shutdown).await;
        record_attempt(venue.name(), outcome.label());
        outcome
    }

    async fn evaluate(&self, venue: &Venue, symbol: &str, shutdown: &Shutdown) -> AttemptOutcome {
        if let Some(reason) = self.risk.halt_reason().await {
            return AttemptOutcome::Halted(reason);
        }

        let Some(quote) = self.fetch_quote(venue, symbol).await else {
            return AttemptOutcome::QuoteUnavailable;
        };

        let mid = quote.mid();
        let band = venue.band().await;
        let spread_pct = quote.spread_pct();
        if spread_pct < band.min_spread_pct {
            return AttemptOutcome::SpreadTooNarrow {
                spread_pct,
                min_spread_pct: band.min_spread_pct,
            };
        }

        let reading = {
            let mut momentum = self.momentum.lock().await;
            momentum.observe(venue.name(), symbol, mid);
            momentum.evaluate(venue.name(), symbol, self.epsilon_pct)
        };
        let Some(direction) = reading.direction() else {
            return AttemptOutcome::NoMomentum {
                pct_move: reading.pct_move,
            };
        };

        let order = EntryOrder {
            venue: venue.name().to_string(),
            symbol: symbol.to_string(),
            side: Side::from(direction),
            size_usd: band.throttled_size(),
            entry_price: mid,
            opened_at: Utc::now(),
        };
        tracing::debug!(
            venue = %order.venue,
            symbol,
            side = %order.side,
            band = %band.name,
            pct_move = %reading.pct_move,
            size_usd = %order.size_usd,
            "Opening paper position"
        );

        // Concurrent attempts may all have passed the gate above; only the
        // ones that win a slot open a position.
        if let Err(reason) = self.risk.reserve().await {
            return AttemptOutcome::Halted(reason);
        }

        let mut shutdown = shutdown.clone();
        let result = tokio::select! {
            result = self.fill.execute(&order) => result,
            _ = shutdown.wait() => {
                tracing::info!(venue = %order.venue, symbol, "Position hold interrupted by shutdown");
                self.risk.release().await;
                return AttemptOutcome::Cancelled;
            }
        };
        let fill = match result {
            Ok(fill) => fill,
            Err(e) => {
                tracing::warn!(venue = %order.venue, symbol, error = %e, "Fill failed");
                self.risk.release().await;
                return AttemptOutcome::FillFailed;
            }
        };

        let record = TradeRecord::close(&order, &fill);
        self.record(&record).await;
        AttemptOutcome::Traded(record)
    }

    async fn fetch_quote(&self, venue: &Venue, symbol: &str) -> Option<Quote> {
        let fetch = venue.quotes().best_bid_ask(symbol);
        let quote = match tokio::time::timeout(self.quote_timeout, fetch).await {
            Ok(Ok(quote)) => quote,
            Ok(Err(e)) => {
                tracing::warn!(venue = %venue.name(), symbol, error = %e, "Quote fetch failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    venue = %venue.name(),
                    symbol,
                    timeout_ms = self.quote_timeout.as_millis() as u64,
                    "Quote fetch timed out"
                );
                return None;
            }
        };

        if quote.mid() <= Decimal::ZERO {
            tracing::warn!(venue = %venue.name(), symbol, "Quote has no usable price");
            return None;
        }
        Some(quote)
    }

    async fn record(&self, record: &TradeRecord) {
        self.recent.write().await.push(record.clone());
        self.risk.settle(record.pnl).await;
        self.telemetry.enqueue_trade(TradeEvent::from(record));
        record_trade(&record.venue, record.pnl.to_f64().unwrap_or_default());

        tracing::info!(
            venue = %record.venue,
            symbol = %record.symbol,
            side = %record.side,
            size_usd = %record.size_usd.round_dp(2),
            entry = %record.entry_price,
            exit = %record.exit_price,
            pnl = %record.pnl.round_dp(4),
            "Paper trade closed"
        );
    }

    /// Pairs whose pacing credit is due this tick
    async fn due_pairs(&self) -> Vec<(Arc<Venue>, String)> {
        let risk_throttle = self.risk.throttle_factor().await;

        let mut paces = Vec::with_capacity(self.venues.len());
        for venue in &self.venues {
            let band = venue.band().await;
            paces.push(pace(band.throttle, risk_throttle));
        }

        let mut pacer = self.pacer.lock().await;
        let mut due = Vec::new();
        for (venue, venue_pace) in self.venues.iter().zip(paces) {
            for symbol in &self.symbols {
                if pacer.tick(venue.name(), symbol, venue_pace) {
                    due.push((venue.clone(), symbol.clone()));
                }
            }
        }
        due
    }

    /// Attempt every due pair concurrently
    pub async fn sweep(&self, shutdown: &Shutdown) -> Vec<AttemptOutcome> {
        let due = self.due_pairs().await;
        let attempts = due
            .iter()
            .map(|(venue, symbol)| self.attempt(venue, symbol, shutdown));
        let outcomes = join_all(attempts).await;

        let traded = outcomes.iter().filter(|o| o.trade().is_some()).count();
        tracing::debug!(attempts = outcomes.len(), traded, "Decision sweep finished");
        outcomes
    }

    /// Sweep on a fixed interval until shutdown
    ///
    /// A sweep is never abandoned midway; attempts in their hold period
    /// observe shutdown themselves and return `Cancelled`.
    pub async fn run(&self, mut shutdown: Shutdown) {
        tracing::info!(
            venues = self.venues.len(),
            symbols = self.symbols.len(),
            interval_ms = self.sweep_interval.as_millis() as u64,
            "Decision engine started"
        );

        loop {
            self.sweep(&shutdown).await;
            if shutdown.is_triggered() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        tracing::info!("Decision engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RiskConfig, VenueConfig, VenueKind};
    use crate::execution::{Fill, PaperFillSimulator};
    use crate::latency::BandTable;
    use crate::risk::HaltReason;
    use crate::shutdown::shutdown_channel;
    use crate::telemetry::telemetry_channel;
    use crate::venue::{QuoteSource, VenueError};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;

    /// Replays a fixed list of quotes, then fails
    struct ScriptedQuotes {
        quotes: std::sync::Mutex<VecDeque<Quote>>,
    }

    impl ScriptedQuotes {
        fn new(mids: &[Decimal], half_spread: Decimal) -> Arc<Self> {
            let quotes = mids
                .iter()
                .map(|mid| Quote::new(*mid - half_spread, *mid + half_spread))
                .collect();
            Arc::new(Self {
                quotes: std::sync::Mutex::new(quotes),
            })
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedQuotes {
        async fn best_bid_ask(&self, _symbol: &str) -> Result<Quote, VenueError> {
            self.quotes
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| VenueError::Malformed("script exhausted".into()))
        }
    }

    /// Fill that never completes
    struct StuckFill;

    #[async_trait]
    impl FillSimulator for StuckFill {
        async fn execute(&self, _order: &EntryOrder) -> anyhow::Result<Fill> {
            std::future::pending().await
        }
    }

    const RISING: [Decimal; 5] = [dec!(100), dec!(100.02), dec!(100.05), dec!(100.08), dec!(100.15)];

    fn venue(quotes: Arc<dyn QuoteSource>) -> Arc<Venue> {
        named_venue("BINANCE", quotes)
    }

    fn named_venue(name: &str, quotes: Arc<dyn QuoteSource>) -> Arc<Venue> {
        let config = VenueConfig {
            name: name.to_string(),
            kind: VenueKind::Binance,
            ping_url: "http://localhost/ping".to_string(),
            quote_base_url: None,
            maker_fee: dec!(0),
            taker_fee: dec!(0),
        };
        Arc::new(Venue::new(&config, quotes, 200, &BandTable::default()))
    }

    async fn fast_venue(quotes: Arc<dyn QuoteSource>) -> Arc<Venue> {
        let venue = venue(quotes);
        venue.record_latency(20.0, &BandTable::default()).await;
        venue
    }

    fn engine(
        venue: Arc<Venue>,
        fill: Arc<dyn FillSimulator>,
        telemetry: TelemetryQueues,
    ) -> TradeDecisionEngine {
        let engine_config = EngineConfig {
            symbols: vec!["BTCUSDT".to_string()],
            ..EngineConfig::default()
        };
        TradeDecisionEngine::new(
            vec![venue],
            RiskLimiter::new(RiskConfig::default()),
            fill,
            telemetry,
            &engine_config,
            &MomentumConfig::default(),
        )
    }

    fn instant_fill() -> Arc<dyn FillSimulator> {
        Arc::new(PaperFillSimulator::new(Duration::ZERO, dec!(0.002)))
    }

    #[tokio::test]
    async fn test_rising_mids_trade_long() {
        // 0.1% spread clears the aggressive 0.03% minimum
        let venue = fast_venue(ScriptedQuotes::new(&RISING, dec!(0.05))).await;
        let (queues, mut receivers) = telemetry_channel(100, true);
        let engine = engine(venue.clone(), instant_fill(), queues);
        let (_trigger, shutdown) = shutdown_channel();

        for _ in 0..4 {
            let outcome = engine.attempt(&venue, "BTCUSDT", &shutdown).await;
            assert!(matches!(outcome, AttemptOutcome::NoMomentum { .. }));
        }

        let outcome = engine.attempt(&venue, "BTCUSDT", &shutdown).await;
        let record = outcome.trade().expect("fifth sample should trade").clone();
        assert_eq!(record.side, Side::Long);
        assert_eq!(record.entry_price, dec!(100.15));
        assert_eq!(record.size_usd, dec!(600.0));
        assert!(record.pnl > Decimal::ZERO);

        assert_eq!(engine.recent_trades().await, vec![record.clone()]);
        let risk = engine.risk().snapshot().await;
        assert_eq!(risk.daily_trades, 1);
        assert_eq!(risk.daily_pnl, record.pnl);

        let events = receivers.drain_trades(10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn test_narrow_spread_skips_momentum() {
        // 0.02% spread is below the aggressive 0.03% minimum
        let venue = fast_venue(ScriptedQuotes::new(&[dec!(100)], dec!(0.01))).await;
        let engine = engine(venue.clone(), instant_fill(), TelemetryQueues::disabled());
        let (_trigger, shutdown) = shutdown_channel();

        let outcome = engine.attempt(&venue, "BTCUSDT", &shutdown).await;
        assert_eq!(
            outcome,
            AttemptOutcome::SpreadTooNarrow {
                spread_pct: dec!(0.02),
                min_spread_pct: dec!(0.03),
            }
        );
        assert_eq!(engine.momentum.lock().await.sample_count("BINANCE", "BTCUSDT"), 0);
    }

    #[tokio::test]
    async fn test_quote_failure_is_unavailable() {
        let venue = fast_venue(ScriptedQuotes::new(&[], dec!(0))).await;
        let engine = engine(venue.clone(), instant_fill(), TelemetryQueues::disabled());
        let (_trigger, shutdown) = shutdown_channel();

        let outcome = engine.attempt(&venue, "BTCUSDT", &shutdown).await;
        assert_eq!(outcome, AttemptOutcome::QuoteUnavailable);
    }

    #[tokio::test]
    async fn test_zero_mid_is_unavailable() {
        let venue = fast_venue(ScriptedQuotes::new(&[dec!(0)], dec!(0))).await;
        let engine = engine(venue.clone(), instant_fill(), TelemetryQueues::disabled());
        let (_trigger, shutdown) = shutdown_channel();

        let outcome = engine.attempt(&venue, "BTCUSDT", &shutdown).await;
        assert_eq!(outcome, AttemptOutcome::QuoteUnavailable);
    }

    #[tokio::test]
    async fn test_halted_engine_does_not_fetch() {
        let quotes = ScriptedQuotes::new(&[dec!(100)], dec!(0.05));
        let venue = fast_venue(quotes.clone()).await;
        let engine = engine(venue.clone(), instant_fill(), TelemetryQueues::disabled());
        engine.risk().apply(dec!(-50)).await;
        let (_trigger, shutdown) = shutdown_channel();

        let outcome = engine.attempt(&venue, "BTCUSDT", &shutdown).await;
        assert!(matches!(outcome, AttemptOutcome::Halted(_)));
        assert_eq!(quotes.quotes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_during_hold_records_nothing() {
        let venue = fast_venue(ScriptedQuotes::new(&RISING, dec!(0.05))).await;
        let engine = engine(venue.clone(), Arc::new(StuckFill), TelemetryQueues::disabled());
        let (trigger, shutdown) = shutdown_channel();

        for _ in 0..4 {
            engine.attempt(&venue, "BTCUSDT", &shutdown).await;
        }
        trigger.trigger();
        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            engine.attempt(&venue, "BTCUSDT", &shutdown),
        )
        .await
        .unwrap();

        assert_eq!(outcome, AttemptOutcome::Cancelled);
        assert!(engine.recent_trades().await.is_empty());
        assert_eq!(engine.risk().snapshot().await.daily_trades, 0);
    }

    /// Mid rises 0.05 on every call, 0.1 wide
    #[derive(Default)]
    struct RisingQuotes {
        calls: std::sync::atomic::AtomicU32,
    }

    #[async_trait]
    impl QuoteSource for RisingQuotes {
        async fn best_bid_ask(&self, _symbol: &str) -> Result<Quote, VenueError> {
            let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let mid = dec!(100) + dec!(0.05) * Decimal::from(n);
            Ok(Quote::new(mid - dec!(0.05), mid + dec!(0.05)))
        }
    }

    #[tokio::test]
    async fn test_trade_cap_is_exact_for_concurrent_attempts() {
        let mut venues = Vec::new();
        for name in ["BINANCE", "OKX"] {
            let venue = named_venue(name, Arc::new(RisingQuotes::default()));
            venue.record_latency(20.0, &BandTable::default()).await;
            venues.push(venue);
        }
        let engine_config = EngineConfig {
            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            ..EngineConfig::default()
        };
        let risk = RiskLimiter::new(RiskConfig {
            max_trades_per_day: 1,
            ..RiskConfig::default()
        });
        // A hold that yields lets all four attempts overlap
        let fill = Arc::new(PaperFillSimulator::new(Duration::from_millis(20), dec!(0.002)));
        let engine = TradeDecisionEngine::new(
            venues,
            risk,
            fill,
            TelemetryQueues::disabled(),
            &engine_config,
            &MomentumConfig::default(),
        );
        let (_trigger, shutdown) = shutdown_channel();

        for _ in 0..4 {
            let outcomes = engine.sweep(&shutdown).await;
            assert_eq!(outcomes.len(), 4);
            assert!(outcomes.iter().all(|o| matches!(o, AttemptOutcome::NoMomentum { .. })));
        }

        let outcomes = engine.sweep(&shutdown).await;
        let traded = outcomes.iter().filter(|o| o.trade().is_some()).count();
        let halted = outcomes
            .iter()
            .filter(|o| matches!(o, AttemptOutcome::Halted(HaltReason::MaxTradesReached(1))))
            .count();
        assert_eq!(traded, 1);
        assert_eq!(halted, 3);

        let risk = engine.risk().snapshot().await;
        assert_eq!(risk.daily_trades, 1);
        assert!(risk.halt.is_some());
        assert_eq!(engine.recent_trades().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_attempt_frees_its_slot() {
        let venue = fast_venue(ScriptedQuotes::new(&RISING, dec!(0.05))).await;
        let engine = engine(venue.clone(), Arc::new(StuckFill), TelemetryQueues::disabled());
        let (trigger, shutdown) = shutdown_channel();

        for _ in 0..4 {
            engine.attempt(&venue, "BTCUSDT", &shutdown).await;
        }
        trigger.trigger();
        let outcome = engine.attempt(&venue, "BTCUSDT", &shutdown).await;

        assert_eq!(outcome, AttemptOutcome::Cancelled);
        assert!(engine.risk().reserve().await.is_ok());
    }

    #[tokio::test]
    async fn test_sweep_paces_defensive_venue() {
        // Unmeasured venue sits in the defensive band (throttle 0.5)
        let venue = venue(ScriptedQuotes::new(&[], dec!(0)));
        let engine = engine(venue, instant_fill(), TelemetryQueues::disabled());
        let (_trigger, shutdown) = shutdown_channel();

        let mut attempts = 0;
        for _ in 0..6 {
            attempts += engine.sweep(&shutdown).await.len();
        }
        assert_eq!(attempts, 3);
    }
}
