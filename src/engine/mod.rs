//! Decision engine module
//!
//! Paced trade attempts across venues and symbols, and the bounded list of
//! recently completed trades.

mod decision;
mod history;
mod pacing;
mod types;

pub use decision::TradeDecisionEngine;
pub use history::RecentTrades;
pub use pacing::{pace, AttemptPacer, MIN_PACE};
pub use types::AttemptOutcome;
