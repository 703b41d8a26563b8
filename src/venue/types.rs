//! Venue types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recoverable venue I/O failures
///
/// Every variant means "no data this cycle"; none of them is fatal.
#[derive(Debug, Error)]
pub enum VenueError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Best bid and ask for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Decimal,
    pub ask: Decimal,
}

impl Quote {
    pub fn new(bid: Decimal, ask: Decimal) -> Self {
        Self { bid, ask }
    }

    /// Midpoint of bid and ask
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// Spread as a percentage of mid; zero when mid is not positive
    pub fn spread_pct(&self) -> Decimal {
        let mid = self.mid();
        if mid <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.ask - self.bid) / mid * Decimal::ONE_HUNDRED
    }
}

/// Point-in-time view of a venue for reporting
#[derive(Debug, Clone, Serialize)]
pub struct VenueSnapshot {
    pub name: String,
    pub last_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub samples: usize,
    pub band: crate::latency::LatencyBand,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
}
