//! Execution module
//!
//! The fill model behind the decision engine. Only the paper simulator
//! exists; a live execution path implements the same trait.

mod paper;
mod types;

pub use paper::PaperFillSimulator;
pub use types::{realized_pnl, EntryOrder, Fill, Side, TradeId, TradeRecord};

use async_trait::async_trait;

/// Trait for fill implementations
#[async_trait]
pub trait FillSimulator: Send + Sync {
    /// Open the position, hold it, and report how it was closed
    async fn execute(&self, order: &EntryOrder) -> anyhow::Result<Fill>;
}
