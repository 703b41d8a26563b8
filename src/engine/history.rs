//! Recent trade history

use crate::execution::TradeRecord;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Bounded list of completed trades, newest first
#[derive(Debug, Clone)]
pub struct RecentTrades {
    trades: VecDeque<TradeRecord>,
    capacity: usize,
}

impl RecentTrades {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            trades: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a trade at the front, evicting the oldest beyond capacity
    pub fn push(&mut self, record: TradeRecord) {
        if self.trades.len() == self.capacity {
            self.trades.pop_back();
        }
        self.trades.push_front(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TradeRecord> {
        self.trades.iter()
    }

    pub fn to_vec(&self) -> Vec<TradeRecord> {
        self.trades.iter().cloned().collect()
    }

    /// Sum of PnL over the retained trades
    pub fn total_pnl(&self) -> Decimal {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
