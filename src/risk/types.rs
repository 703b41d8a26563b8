//! Risk management types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reason trading is halted for the rest of the day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// Daily loss reached the configured ceiling
    MaxDailyLossReached(Decimal),
    /// Daily trade count reached the configured cap
    MaxTradesReached(u32),
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::MaxDailyLossReached(pnl) => write!(f, "daily loss limit reached (pnl {pnl})"),
            HaltReason::MaxTradesReached(count) => write!(f, "daily trade cap reached ({count} trades)"),
        }
    }
}

/// Point-in-time view of the daily risk state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSnapshot {
    pub day: NaiveDate,
    pub daily_pnl: Decimal,
    pub daily_trades: u32,
    pub throttle_factor: Decimal,
    pub halt: Option<HaltReason>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_halt_reason_display() {
        let reason = HaltReason::MaxDailyLossReached(dec!(-50.5));
        assert!(reason.to_string().contains("-50.5"));
        let reason = HaltReason::MaxTradesReached(250);
        assert!(reason.to_string().contains("250"));
    }
}
