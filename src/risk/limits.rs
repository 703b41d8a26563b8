//! Daily loss and trade-count limits

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::HaltReason;
use crate::config::RiskConfig;

/// Daily PnL and trade count for one UTC day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRiskState {
    day: NaiveDate,
    daily_pnl: Decimal,
    daily_trades: u32,
    /// Trades between `reserve` and `settle`/`release`; they count against
    /// the trade cap and survive a day rollover.
    open_trades: u32,
}

impl DailyRiskState {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            daily_pnl: dec!(0),
            daily_trades: 0,
            open_trades: 0,
        }
    }

    /// Reset the counters when `today` is a later day; returns true on reset
    ///
    /// A clock stepping backwards never resets mid-day.
    pub fn roll(&mut self, today: NaiveDate) -> bool {
        if today <= self.day {
            return false;
        }
        self.day = today;
        self.daily_pnl = dec!(0);
        self.daily_trades = 0;
        true
    }

    /// Record one completed trade
    pub fn apply(&mut self, pnl: Decimal) {
        self.daily_pnl += pnl;
        self.daily_trades += 1;
    }

    /// Claim a trade slot, failing when a limit is already reached
    pub fn reserve(&mut self, limits: &RiskConfig) -> Result<(), HaltReason> {
        if let Some(reason) = self.halt_reason(limits) {
            return Err(reason);
        }
        self.open_trades += 1;
        Ok(())
    }

    /// Give back a slot whose trade never completed
    pub fn release(&mut self) {
        self.open_trades = self.open_trades.saturating_sub(1);
    }

    /// Close a reserved trade with its PnL
    pub fn settle(&mut self, pnl: Decimal) {
        self.release();
        self.apply(pnl);
    }

    /// Which limit, if any, blocks new trades
    pub fn halt_reason(&self, limits: &RiskConfig) -> Option<HaltReason> {
        self.limit_reached(limits, self.daily_trades + self.open_trades)
    }

    /// Like `halt_reason`, counting completed trades only
    pub fn settled_halt_reason(&self, limits: &RiskConfig) -> Option<HaltReason> {
        self.limit_reached(limits, self.daily_trades)
    }

    fn limit_reached(&self, limits: &RiskConfig, trades: u32) -> Option<HaltReason> {
        if self.daily_pnl <= -limits.max_daily_loss_usd {
            return Some(HaltReason::MaxDailyLossReached(self.daily_pnl));
        }
        if trades >= limits.max_trades_per_day {
            return Some(HaltReason::MaxTradesReached(trades));
        }
        None
    }

    /// Drawdown as a fraction of the loss ceiling, capped at 1
    ///
    /// Zero on flat or positive days.
    pub fn drawdown_ratio(&self, limits: &RiskConfig) -> Decimal {
        if self.daily_pnl >= Decimal::ZERO || limits.max_daily_loss_usd <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.daily_pnl.abs() / limits.max_daily_loss_usd).min(Decimal::ONE)
    }

    /// Attempt-rate multiplier: `max(floor, 1 - drawdown_ratio * sensitivity)`
    pub fn throttle_factor(&self, limits: &RiskConfig) -> Decimal {
        if self.daily_pnl >= Decimal::ZERO {
            return Decimal::ONE;
        }
        let factor = Decimal::ONE - self.drawdown_ratio(limits) * limits.drawdown_sensitivity;
        factor.max(limits.throttle_floor)
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn daily_pnl(&self) -> Decimal {
        self.daily_pnl
    }

    pub fn daily_trades(&self) -> u32 {
        self.daily_trades
    }

    pub fn open_trades(&self) -> u32 {
        self.open_trades
    }
}
