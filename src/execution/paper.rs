//! Paper fill simulator

use super::{EntryOrder, Fill, FillSimulator, Side};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::time::{Duration, Instant};

/// Simulated fills: hold for a fixed period, exit a fixed fraction away
/// from entry in the trade's direction
pub struct PaperFillSimulator {
    hold: Duration,
    exit_move: Decimal,
}

impl PaperFillSimulator {
    /// `exit_move` is a fraction of entry (0.002 = 0.2%)
    pub fn new(hold: Duration, exit_move: Decimal) -> Self {
        Self { hold, exit_move }
    }

    /// Exit price for an entry and side
    pub fn exit_price(&self, entry_price: Decimal, side: Side) -> Decimal {
        match side {
            Side::Long => entry_price * (Decimal::ONE + self.exit_move),
            Side::Short => entry_price * (Decimal::ONE - self.exit_move),
        }
    }
}

#[async_trait]
impl FillSimulator for PaperFillSimulator {
    async fn execute(&self, order: &EntryOrder) -> anyhow::Result<Fill> {
        let started = Instant::now();
        tokio::time::sleep(self.hold).await;

        let exit_price = self.exit_price(order.entry_price, order.side);
        tracing::debug!(
            venue = %order.venue,
            symbol = %order.symbol,
            side = %order.side,
            entry = %order.entry_price,
            exit = %exit_price,
            "Paper position closed"
        );

        Ok(Fill {
            exit_price,
            closed_at: Utc::now(),
            held: started.elapsed(),
        })
    }
}
