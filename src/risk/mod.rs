//! Risk management module
//!
//! Daily loss and trade-count gates plus drawdown-based throttling.

mod limits;
mod types;

pub use limits::DailyRiskState;
pub use types::{HaltReason, RiskSnapshot};

use crate::config::RiskConfig;
use crate::telemetry::{set_gauge, GaugeMetric};
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared daily risk limiter
///
/// Every operation first applies the UTC day rollover under the same write
/// lock, so a reset is never interleaved with a read or an update.
#[derive(Clone)]
pub struct RiskLimiter {
    limits: RiskConfig,
    state: Arc<RwLock<DailyRiskState>>,
}

impl RiskLimiter {
    pub fn new(limits: RiskConfig) -> Self {
        Self::starting_on(limits, today())
    }

    /// Create a limiter whose current day is `day`
    pub fn starting_on(limits: RiskConfig, day: NaiveDate) -> Self {
        Self {
            limits,
            state: Arc::new(RwLock::new(DailyRiskState::new(day))),
        }
    }

    pub fn limits(&self) -> &RiskConfig {
        &self.limits
    }

    pub async fn allow_trade(&self) -> bool {
        self.allow_trade_on(today()).await
    }

    pub async fn allow_trade_on(&self, today: NaiveDate) -> bool {
        self.halt_reason_on(today).await.is_none()
    }

    /// Limit currently blocking trades, if any
    pub async fn halt_reason(&self) -> Option<HaltReason> {
        self.halt_reason_on(today()).await
    }

    pub async fn halt_reason_on(&self, today: NaiveDate) -> Option<HaltReason> {
        let mut state = self.state.write().await;
        self.roll(&mut state, today);
        state.halt_reason(&self.limits)
    }

    /// Record a completed trade's PnL and count it
    pub async fn apply(&self, pnl: Decimal) {
        self.apply_on(today(), pnl).await
    }

    pub async fn apply_on(&self, today: NaiveDate, pnl: Decimal) {
        self.close_on(today, |state| state.apply(pnl)).await
    }

    /// Claim a trade slot before opening a position
    ///
    /// The check and the claim happen under one lock, so concurrent attempts
    /// can never open more trades than the daily cap allows.
    pub async fn reserve(&self) -> Result<(), HaltReason> {
        self.reserve_on(today()).await
    }

    pub async fn reserve_on(&self, today: NaiveDate) -> Result<(), HaltReason> {
        let mut state = self.state.write().await;
        self.roll(&mut state, today);
        state.reserve(&self.limits)
    }

    /// Return a slot whose position never closed
    pub async fn release(&self) {
        self.state.write().await.release();
    }

    /// Record a reserved trade's PnL and count it
    pub async fn settle(&self, pnl: Decimal) {
        self.settle_on(today(), pnl).await
    }

    pub async fn settle_on(&self, today: NaiveDate, pnl: Decimal) {
        self.close_on(today, |state| state.settle(pnl)).await
    }

    async fn close_on(&self, today: NaiveDate, close: impl FnOnce(&mut DailyRiskState)) {
        let mut state = self.state.write().await;
        self.roll(&mut state, today);

        let was_halted = state.settled_halt_reason(&self.limits).is_some();
        close(&mut *state);

        set_gauge(GaugeMetric::DailyPnl, state.daily_pnl().to_f64().unwrap_or_default());
        set_gauge(GaugeMetric::DailyTrades, f64::from(state.daily_trades()));
        set_gauge(
            GaugeMetric::ThrottleFactor,
            state.throttle_factor(&self.limits).to_f64().unwrap_or(1.0),
        );

        if let Some(reason) = state.settled_halt_reason(&self.limits) {
            if !was_halted {
                tracing::warn!(%reason, "Daily risk limit reached, trading halted");
            }
        }
    }

    /// Attempt-rate multiplier under drawdown, in `[floor, 1]`
    pub async fn throttle_factor(&self) -> Decimal {
        self.throttle_factor_on(today()).await
    }

    pub async fn throttle_factor_on(&self, today: NaiveDate) -> Decimal {
        let mut state = self.state.write().await;
        self.roll(&mut state, today);
        state.throttle_factor(&self.limits)
    }

    pub async fn snapshot(&self) -> RiskSnapshot {
        self.snapshot_on(today()).await
    }

    pub async fn snapshot_on(&self, today: NaiveDate) -> RiskSnapshot {
        let mut state = self.state.write().await;
        self.roll(&mut state, today);
        RiskSnapshot {
            day: state.day(),
            daily_pnl: state.daily_pnl(),
            daily_trades: state.daily_trades(),
            throttle_factor: state.throttle_factor(&self.limits),
            halt: state.halt_reason(&self.limits),
        }
    }

    fn roll(&self, state: &mut DailyRiskState, today: NaiveDate) {
        let previous = state.day();
        if state.roll(today) {
            tracing::info!(%previous, %today, "New UTC day, daily risk counters reset");
            set_gauge(GaugeMetric::DailyPnl, 0.0);
            set_gauge(GaugeMetric::DailyTrades, 0.0);
            set_gauge(GaugeMetric::ThrottleFactor, 1.0);
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
