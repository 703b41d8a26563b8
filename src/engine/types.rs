//! Decision engine types

use crate::execution::TradeRecord;
use crate::risk::HaltReason;
use rust_decimal::Decimal;

/// How one trade attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// A daily risk limit blocks new trades
    Halted(HaltReason),
    /// Quote fetch failed, timed out or returned no usable price
    QuoteUnavailable,
    /// Spread is below the band minimum
    SpreadTooNarrow {
        spread_pct: Decimal,
        min_spread_pct: Decimal,
    },
    /// Momentum did not clear the threshold
    NoMomentum { pct_move: Decimal },
    /// Shutdown arrived during the hold; nothing was recorded
    Cancelled,
    /// The fill simulator returned an error; nothing was recorded
    FillFailed,
    Traded(TradeRecord),
}

impl AttemptOutcome {
    /// Short label used in metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Halted(_) => "halted",
            AttemptOutcome::QuoteUnavailable => "quote_unavailable",
            AttemptOutcome::SpreadTooNarrow { .. } => "spread_too_narrow",
            AttemptOutcome::NoMomentum { .. } => "no_momentum",
            AttemptOutcome::Cancelled => "cancelled",
            AttemptOutcome::FillFailed => "fill_failed",
            AttemptOutcome::Traded(_) => "traded",
        }
    }

    pub fn trade(&self) -> Option<&TradeRecord> {
        match self {
            AttemptOutcome::Traded(record) => Some(record),
            _ => None,
        }
    }
}
