//! Execution types

use crate::momentum::MomentumDirection;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Trade identifier
pub type TradeId = Uuid;

/// Position side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }
}

impl From<MomentumDirection> for Side {
    fn from(direction: MomentumDirection) -> Self {
        match direction {
            MomentumDirection::Up => Side::Long,
            MomentumDirection::Down => Side::Short,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position to open at the current mid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryOrder {
    pub venue: String,
    pub symbol: String,
    pub side: Side,
    /// Notional in quote currency
    pub size_usd: Decimal,
    pub entry_price: Decimal,
    pub opened_at: DateTime<Utc>,
}

/// How a position was closed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub exit_price: Decimal,
    pub closed_at: DateTime<Utc>,
    /// Time the position was held
    pub held: Duration,
}

/// A completed round-trip trade
///
/// Records are created once by the decision engine and only ever cloned
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: TradeId,
    pub timestamp: DateTime<Utc>,
    pub venue: String,
    pub symbol: String,
    pub side: Side,
    pub size_usd: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub pnl: Decimal,
    pub duration: Duration,
}

impl TradeRecord {
    /// Close an order against its fill
    pub fn close(order: &EntryOrder, fill: &Fill) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: fill.closed_at,
            venue: order.venue.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            size_usd: order.size_usd,
            entry_price: order.entry_price,
            exit_price: fill.exit_price,
            pnl: realized_pnl(order.side, order.entry_price, fill.exit_price, order.size_usd),
            duration: fill.held,
        }
    }
}

/// PnL of a round trip: `(exit - entry) * size / entry`, sign flipped for shorts
pub fn realized_pnl(side: Side, entry_price: Decimal, exit_price: Decimal, size_usd: Decimal) -> Decimal {
    if entry_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let quantity = size_usd / entry_price;
    match side {
        Side::Long => (exit_price - entry_price) * quantity,
        Side::Short => (entry_price - exit_price) * quantity,
    }
}
