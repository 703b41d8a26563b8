//! Periodic status report

use crate::engine::TradeDecisionEngine;
use crate::shutdown::Shutdown;
use crate::telemetry::TelemetryQueues;
use std::sync::Arc;
use std::time::Duration;

/// Logs a venue, risk and trade summary on a fixed interval
pub struct StatusReporter {
    engine: Arc<TradeDecisionEngine>,
    telemetry: TelemetryQueues,
    interval: Duration,
}

impl StatusReporter {
    pub fn new(engine: Arc<TradeDecisionEngine>, telemetry: TelemetryQueues, interval: Duration) -> Self {
        Self {
            engine,
            telemetry,
            interval,
        }
    }

    /// Emit one report
    pub async fn report(&self) {
        for venue in self.engine.venues() {
            let snapshot = venue.snapshot().await;
            tracing::info!(
                venue = %snapshot.name,
                last_ms = snapshot.last_ms.unwrap_or_default().round(),
                avg_ms = snapshot.avg_ms.unwrap_or_default().round(),
                max_ms = snapshot.max_ms.unwrap_or_default().round(),
                band = %snapshot.band.name,
                min_spread_pct = %snapshot.band.min_spread_pct,
                size_usd = %snapshot.band.size_usd,
                throttle = %snapshot.band.throttle,
                "Venue status"
            );
        }

        let risk = self.engine.risk().snapshot().await;
        let limits = self.engine.risk().limits();
        tracing::info!(
            day = %risk.day,
            daily_pnl = %risk.daily_pnl.round_dp(2),
            daily_trades = risk.daily_trades,
            max_trades = limits.max_trades_per_day,
            max_loss_usd = %limits.max_daily_loss_usd,
            throttle_factor = %risk.throttle_factor.round_dp(2),
            halted = risk.halt.is_some(),
            "Risk status"
        );

        let trades = self.engine.recent_trades().await;
        if let Some(last) = trades.first() {
            tracing::info!(
                recent = trades.len(),
                venue = %last.venue,
                symbol = %last.symbol,
                side = %last.side,
                pnl = %last.pnl.round_dp(2),
                "Last trade"
            );
        }

        if self.telemetry.is_enabled() {
            tracing::info!(
                pending_latency = self.telemetry.pending_latency(),
                pending_trades = self.telemetry.pending_trades(),
                "Telemetry status"
            );
        }
    }

    pub async fn run(&self, mut shutdown: Shutdown) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => self.report().await,
                _ = shutdown.wait() => break,
            }
        }
    }
}
